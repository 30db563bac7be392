//! Star rating tokens.

const STAR: &str = "⭐";

/// Parse a rating button or digit. `⭐⭐⭐` and `3` both yield 3.
pub fn parse_rating(token: &str) -> Option<u8> {
    let token = token.trim();

    if let Ok(rating) = token.parse::<u8>() {
        return (1..=5).contains(&rating).then_some(rating);
    }

    if token.is_empty() || !token.split(STAR).all(str::is_empty) {
        return None;
    }

    let count = token.matches(STAR).count();
    u8::try_from(count)
        .ok()
        .filter(|rating| (1..=5).contains(rating))
}

pub fn stars(rating: i64) -> String {
    STAR.repeat(usize::try_from(rating).unwrap_or_default())
}
