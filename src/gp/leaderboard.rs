use crate::error::PageOutOfBounds;
use poise::serenity_prelude::{Mentionable, UserId};

/// Number of rows shown on each page
pub const ENTRIES_PER_PAGE: usize = 25;

pub fn page_count(rows: usize) -> usize {
    rows.div_ceil(ENTRIES_PER_PAGE)
}

/// Converts a page number into a 0-indexed page.
/// Negative numbers count from the end (-1 is the last page).
pub fn resolve_page(num_pages: usize, page: i64) -> Result<usize, PageOutOfBounds> {
    let resolved = if page < 0 {
        num_pages as i64 + page
    } else {
        page
    };

    if resolved >= 0 && (resolved as usize) < num_pages {
        Ok(resolved as usize)
    } else {
        Err(PageOutOfBounds { num_pages })
    }
}

/// The rows shown on `page`, following [`resolve_page`].
pub fn paginate<T>(rows: &[T], page: i64) -> Result<&[T], PageOutOfBounds> {
    let page = resolve_page(page_count(rows.len()), page)?;
    let start = page * ENTRIES_PER_PAGE;
    let end = usize::min(start + ENTRIES_PER_PAGE, rows.len());
    Ok(&rows[start..end])
}

/// Ranked list of users and their GP, split into pages for display.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    rows: Vec<(UserId, i64)>,
}

impl Leaderboard {
    /// Rows must already be sorted in the order they should be displayed.
    pub fn new(rows: Vec<(UserId, i64)>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn num_pages(&self) -> usize {
        page_count(self.rows.len())
    }

    pub fn resolve_page(&self, page: i64) -> Result<usize, PageOutOfBounds> {
        resolve_page(self.num_pages(), page)
    }

    /// Formats one page as `mention: points` lines.
    pub fn page(&self, page: i64) -> Result<String, PageOutOfBounds> {
        Ok(paginate(&self.rows, page)?
            .iter()
            .map(|(user, points)| format!("{}: {}", user.mention(), points))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(len: u64) -> Leaderboard {
        Leaderboard::new(
            (1..=len)
                .map(|i| (UserId::new(i), (1000 - i) as i64))
                .collect(),
        )
    }

    #[test]
    fn counts_partial_pages() {
        assert_eq!(board(0).num_pages(), 0);
        assert_eq!(board(25).num_pages(), 1);
        assert_eq!(board(26).num_pages(), 2);
    }

    #[test]
    fn negative_pages_count_from_the_end() {
        let board = board(60);
        assert_eq!(board.resolve_page(-1), Ok(2));
        assert_eq!(board.resolve_page(-3), Ok(0));
        assert_eq!(board.resolve_page(-4), Err(PageOutOfBounds { num_pages: 3 }));
        assert_eq!(board.resolve_page(3), Err(PageOutOfBounds { num_pages: 3 }));
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let page = board(27).page(-1).unwrap();
        assert_eq!(page, "<@26>: 974\n<@27>: 973");
    }

    #[test]
    fn paginate_splits_any_rows() {
        let rows: Vec<u32> = (0..30).collect();
        assert_eq!(paginate(&rows, 0).unwrap().len(), 25);
        assert_eq!(paginate(&rows, 1).unwrap(), &rows[25..]);
        assert_eq!(paginate(&rows, -1).unwrap(), &rows[25..]);
        assert_eq!(paginate(&rows, 2), Err(PageOutOfBounds { num_pages: 2 }));
    }

    #[test]
    fn empty_board_has_no_pages() {
        assert!(board(0).page(0).is_err());
    }
}
