use rand::seq::{IndexedRandom, SliceRandom};

/// Fixed padding alphabet: punctuation symbols plus the digits 0-9.
const SPECIAL_CHARS: [char; 22] = [
    '~', '@', '#', '$', '%', '^', '&', '*', '/', '-', '+', ';', '?', '{', '}', '(', ')', '[', ']',
    '|', '_', '=',
];
const NUMBERS: [char; 10] = ['1', '2', '3', '4', '5', '6', '7', '8', '9', '0'];

/// Once the chosen words carry this many characters, the shorter padding
/// sample is enough.
const WORD_LENGTH_THRESHOLD: usize = 10;
const SHORT_SAMPLE: usize = 5;
const LONG_SAMPLE: usize = 10;

/// Derive one password from the given sentences.
///
/// One word is drawn uniformly from each sentence; the result is padded with
/// symbols/digits sampled without replacement (5 when the words already sum
/// to 10+ characters, 10 otherwise), shuffled, and joined with no separator.
/// Not deterministic and not meant to be.
pub fn generate_password(sentences: &[String]) -> String {
    let mut rng = rand::rng();

    let mut parts: Vec<String> = Vec::with_capacity(sentences.len() + LONG_SAMPLE);
    let mut word_chars = 0usize;

    for sentence in sentences {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if let Some(word) = words.choose(&mut rng) {
            let word = word.trim();
            word_chars += word.chars().count();
            parts.push(word.to_string());
        }
    }

    let sample_size = if word_chars >= WORD_LENGTH_THRESHOLD {
        SHORT_SAMPLE
    } else {
        LONG_SAMPLE
    };

    let alphabet: Vec<char> = SPECIAL_CHARS.iter().chain(NUMBERS.iter()).copied().collect();
    for c in alphabet.choose_multiple(&mut rng, sample_size) {
        parts.push(c.to_string());
    }

    parts.shuffle(&mut rng);
    parts.concat()
}

/// Generate a batch of `n` candidate passwords. Each call is independent;
/// nothing guarantees distinct outputs across the batch.
pub fn generate_passwords(sentences: &[String], n: usize) -> Vec<String> {
    (0..n).map(|_| generate_password(sentences)).collect()
}
