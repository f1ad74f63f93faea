//! Surface statistics over post text: counts, syllables, readability, emoji.

/// Tokens containing at least one alphanumeric character.
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .collect()
}

/// Number of sentences. `.`, `!`, `?` and line breaks terminate a sentence,
/// except a `.` directly followed by a digit (decimals like `3.5`).
/// Non-empty text without terminators counts as one sentence.
pub fn sentence_count(text: &str) -> u32 {
    let mut count = 0u32;
    let mut has_content = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let terminator = match c {
            '!' | '?' | '\n' => true,
            '.' => !chars.peek().is_some_and(|next| next.is_ascii_digit()),
            _ => false,
        };
        if terminator {
            if has_content {
                count += 1;
            }
            has_content = false;
        } else if c.is_alphanumeric() {
            has_content = true;
        }
    }
    if has_content {
        count += 1;
    }
    count
}

/// Vowel-group syllable estimate with a silent trailing `e`.
pub fn syllables(word: &str) -> u32 {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();
    if letters.is_empty() {
        return 0;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut count = 0u32;
    let mut prev_vowel = false;
    for &c in &letters {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    let n = letters.len();
    if count > 1 && letters[n - 1] == 'e' && !(n >= 2 && letters[n - 2] == 'l') {
        count -= 1;
    }
    count.max(1)
}

/// Flesch-Kincaid grade level. Zero for text without words or sentences.
pub fn flesch_kincaid_grade(word_count: u32, sentence_count: u32, syllable_count: u32) -> f64 {
    if word_count == 0 || sentence_count == 0 {
        return 0.0;
    }
    let words = f64::from(word_count);
    let grade = 0.39 * (words / f64::from(sentence_count))
        + 11.8 * (f64::from(syllable_count) / words)
        - 15.59;
    grade.max(0.0)
}

pub fn is_emoji(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1F000..=0x1F2FF
            | 0x1F300..=0x1F5FF
            | 0x1F600..=0x1F64F
            | 0x1F680..=0x1F6FF
            | 0x1F900..=0x1F9FF
            | 0x1FA70..=0x1FAFF
            | 0x2600..=0x26FF
            | 0x2700..=0x27BF
            | 0x2B50
            | 0x2B55
            | 0x231A..=0x231B
            | 0x23E9..=0x23F3
    )
}

pub fn emoji_count(text: &str) -> u32 {
    text.chars().filter(|c| is_emoji(*c)).count() as u32
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
