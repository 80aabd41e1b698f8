pub mod gp_buttons;
