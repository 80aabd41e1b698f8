/// Logarithm of `number` in an arbitrary `base`.
pub fn log(base: f64, number: f64) -> f64 {
    number.ln() / base.ln()
}

/// GP a user earns for `user_messages` turns in a thread with `thread_messages` messages.
///
/// More turns give logarithmically more GP, busier threads give less, and the
/// first points in a busy thread are harder to earn than later ones.
pub fn support_gp(user_messages: u32, thread_messages: u32) -> f64 {
    let user_messages = f64::from(user_messages);
    let thread_messages = f64::from(thread_messages);

    // Only used to scale the penalty
    let base_gp = log(3.0, user_messages * 0.4 + 1.0);
    let base_penalty_factor = log(2.1, thread_messages * 0.08 + 1.0);
    let penalty_factor = f64::max(
        1.0,
        ((base_penalty_factor - 1.0) / 2f64.powf(f64::max(1.0, base_gp) - 1.0)) + 1.0,
    );

    log(3.0, (user_messages * 0.4 / penalty_factor) + 1.0)
}
