//! General news lexicon scorer.

/// Word weights for news headlines.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    // Positive signals
    ("good", 0.3),
    ("great", 0.4),
    ("excellent", 0.5),
    ("positive", 0.4),
    ("success", 0.5),
    ("successful", 0.5),
    ("win", 0.4),
    ("wins", 0.4),
    ("victory", 0.5),
    ("growth", 0.4),
    ("gain", 0.3),
    ("gains", 0.3),
    ("rally", 0.4),
    ("rise", 0.2),
    ("rises", 0.2),
    ("record", 0.3),
    ("boost", 0.4),
    ("improve", 0.3),
    ("improves", 0.3),
    ("recovery", 0.4),
    ("breakthrough", 0.5),
    ("agreement", 0.3),
    ("peace", 0.5),
    ("celebrate", 0.5),
    ("hope", 0.3),
    ("safe", 0.3),
    ("strong", 0.3),
    ("approved", 0.4),
    // Negative signals
    ("bad", -0.4),
    ("crash", -0.6),
    ("crashes", -0.6),
    ("crisis", -0.6),
    ("war", -0.7),
    ("attack", -0.6),
    ("killed", -0.8),
    ("dead", -0.7),
    ("death", -0.6),
    ("deaths", -0.6),
    ("disaster", -0.7),
    ("collapse", -0.6),
    ("fall", -0.3),
    ("falls", -0.3),
    ("loss", -0.4),
    ("losses", -0.4),
    ("fear", -0.4),
    ("fears", -0.4),
    ("threat", -0.4),
    ("fail", -0.4),
    ("failed", -0.4),
    ("failure", -0.4),
    ("scandal", -0.5),
    ("fraud", -0.6),
    ("recession", -0.6),
    ("inflation", -0.3),
    ("layoffs", -0.5),
    ("lawsuit", -0.4),
    ("protest", -0.3),
    ("violence", -0.7),
    ("outbreak", -0.5),
    ("warning", -0.3),
    ("worst", -0.6),
    ("terrible", -0.6),
];

/// Words that flip the weight of the next scored word.
const NEGATORS: &[&str] = &["not", "no", "never", "without", "isn't", "wasn't", "don't", "doesn't"];

/// Score a text string using the news lexicon.
///
/// Splits text into lowercase words and sums matching weights. A weighted
/// word directly after a negator ("not good") counts with its sign flipped.
/// The result is clamped to `[-1.0, 1.0]`; empty or unknown text is `0.0`.
#[must_use]
pub fn lexicon_score(text: &str) -> f32 {
    let mut score = 0.0_f32;
    let mut negate = false;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic() && c != '\'')
            .to_lowercase();
        if NEGATORS.contains(&w.as_str()) {
            negate = true;
            continue;
        }
        if let Some(&(_, weight)) = LEXICON.iter().find(|(lex_word, _)| *lex_word == w) {
            score += if negate { -weight } else { weight };
        }
        negate = false;
    }
    score.clamp(-1.0, 1.0)
}
