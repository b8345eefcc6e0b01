//! Negation phrase extraction.
//!
//! Works on the raw text: no lower-casing and no stop-word removal, unlike
//! the distance tokenizer. A phrase is the window of whitespace tokens
//! around an exact occurrence of the negation word; windows truncate at text
//! boundaries rather than padding.
//!
//! Detection is gated on the space-padded word appearing as a substring of
//! the text, case-sensitively. A marker sitting at the very start or end of
//! the text has no surrounding spaces and therefore does not pass the gate.

use std::borrow::Cow;

use crate::types::NegationSignal;

/// Extracts every windowed phrase around `word` in `text`.
///
/// A `word` containing a space is collapsed to a single token and every
/// occurrence in the text is rewritten to the collapsed form before
/// tokenization; the emitted phrase restores the original form. Even `ngram`
/// values widen to the next odd number so the window is centered. Phrases
/// are returned in left-to-right occurrence order.
pub fn negation_phrases(text: &str, word: &str, ngram: usize) -> Vec<String> {
    let (collapsed, scanned): (Cow<'_, str>, Cow<'_, str>) = if word.contains(' ') {
        let collapsed = word.replace(' ', "");
        let rewritten = text.replace(word, &collapsed);
        (Cow::Owned(collapsed), Cow::Owned(rewritten))
    } else {
        (Cow::Borrowed(word), Cow::Borrowed(text))
    };

    let collapsed: &str = &collapsed;
    let padded = format!(" {collapsed} ");
    if !scanned.contains(&padded) {
        return Vec::new();
    }

    let ngram = if ngram % 2 == 0 { ngram + 1 } else { ngram };
    let half = (ngram / 2) as isize;

    let mut tokens: Vec<Cow<'_, str>> = scanned.split_whitespace().map(Cow::Borrowed).collect();
    let matches: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| token.as_ref() == collapsed)
        .map(|(index, _)| index)
        .collect();

    let mut phrases = Vec::with_capacity(matches.len());
    for index in matches {
        // Restore the uncollapsed form in the shared token list so every
        // window that covers this occurrence sees the original marker.
        tokens[index] = Cow::Owned(tokens[index].replace(collapsed, word));

        let mut phrase = String::new();
        for position in (index as isize - half)..=(index as isize + half) {
            if position < 0 || position as usize >= tokens.len() {
                continue;
            }
            if !phrase.is_empty() {
                phrase.push(' ');
            }
            phrase.push_str(tokens[position as usize].as_ref());
        }
        phrases.push(phrase);
    }

    phrases
}

/// Joint presence signal for a text pair. Each side is scanned on its own;
/// the other text never influences the result.
pub(crate) fn negation_signal(
    text1: &str,
    text2: &str,
    word: &str,
    ngram: usize,
) -> NegationSignal {
    let first = !negation_phrases(text1, word, ngram).is_empty();
    let second = !negation_phrases(text2, word, ngram).is_empty();
    NegationSignal::from_presence(first, second)
}
