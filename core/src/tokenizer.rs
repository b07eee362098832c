use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Tokens must be longer than this, measured before normalization.
pub const MIN_TOKEN_LEN: usize = 2;

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Strip everything outside `[a-z0-9]`. May yield an empty string.
pub fn normalize(token: &str) -> String {
    NON_ALNUM.replace_all(token, "").into_owned()
}

/// Tokenize a raw query: lowercase, split on whitespace, drop short tokens and
/// stop words, then normalize. Order and duplicates are preserved.
///
/// A token made only of punctuation (e.g. `"!!!"`) survives the length filter
/// and comes out as `""`.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split_whitespace()
        .filter(|token| token.chars().count() > MIN_TOKEN_LEN)
        .filter(|token| !is_stopword(token))
        .map(normalize)
        .collect()
}
