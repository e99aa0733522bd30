//! Rule-based stemmer for Indonesian.
//!
//! Strips inflectional particles and possessive pronouns, then derivational
//! prefixes and suffixes. Words with two or fewer vowels are never touched,
//! which stops the rules from eating short roots. Each call keeps a small set
//! of flags recording which prefix class it removed, so that prefix/suffix
//! pairs that never occur together in Indonesian (`ke-...-kan`, `di-...-an`,
//! `ber-...-i`, ...) are not both stripped from the same word.
//!
//! The stemmer is a pure function: input is a lowercase `[a-z0-9]` token and
//! the output is never longer than the input. Non-ASCII input is returned as-is.
//!
//! ```
//! use telusur_core::stemmer::stem;
//!
//! assert_eq!(stem("menyapu"), "sapu");
//! assert_eq!(stem("pembangunan"), "bangun");
//! assert_eq!(stem("buku"), "buku");
//! ```

/// Prefix classes whose removal restricts later suffix removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removed {
    Ke,
    Peng,
    Di,
    Meng,
    Ter,
    Ber,
    Pe,
}

impl Removed {
    fn bit(self) -> u8 {
        1 << self as u8
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags(u8);

impl Flags {
    fn insert(&mut self, r: Removed) {
        self.0 |= r.bit();
    }

    fn contains(self, r: Removed) -> bool {
        self.0 & r.bit() != 0
    }

    fn contains_any(self, rs: &[Removed]) -> bool {
        rs.iter().any(|&r| self.contains(r))
    }
}

/// First-order prefix rule: `prefix` is replaced by `replacement`.
///
/// With `before_vowel` set the rule only fires when the character right after
/// the prefix is a vowel (nasal assimilation: `meny-apu` -> `s-apu`).
struct PrefixRule {
    prefix: &'static str,
    before_vowel: bool,
    replacement: &'static str,
    tag: Removed,
}

const fn rule(prefix: &'static str, before_vowel: bool, replacement: &'static str, tag: Removed) -> PrefixRule {
    PrefixRule { prefix, before_vowel, replacement, tag }
}

// Order matters: the first matching rule wins.
const FIRST_ORDER: &[PrefixRule] = &[
    rule("meng", false, "", Removed::Meng),
    rule("meny", true, "s", Removed::Meng),
    rule("mem", true, "p", Removed::Meng),
    rule("mem", false, "", Removed::Meng),
    rule("men", true, "t", Removed::Meng),
    rule("men", false, "", Removed::Meng),
    rule("me", false, "", Removed::Meng),
    rule("peng", false, "", Removed::Peng),
    rule("peny", true, "s", Removed::Peng),
    rule("pem", true, "p", Removed::Peng),
    rule("pem", false, "", Removed::Peng),
    rule("pen", true, "t", Removed::Peng),
    rule("pen", false, "", Removed::Peng),
    rule("di", false, "", Removed::Di),
    rule("ter", false, "", Removed::Ter),
    rule("ke", false, "", Removed::Ke),
];

const PARTICLES: &[&str] = &["kah", "lah", "pun"];

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// The word being stemmed plus the flags set while stemming it.
struct Word {
    text: String,
    flags: Flags,
}

impl Word {
    fn syllables(&self) -> usize {
        self.text.bytes().filter(|&b| is_vowel(b)).count()
    }

    /// Affix removal is only attempted on words with more than two vowels.
    fn strippable(&self) -> bool {
        self.syllables() > 2
    }

    fn byte(&self, i: usize) -> Option<u8> {
        self.text.as_bytes().get(i).copied()
    }

    fn drop_suffix(&mut self, n: usize) {
        let len = self.text.len() - n;
        self.text.truncate(len);
    }

    fn replace_prefix(&mut self, n: usize, replacement: &str) {
        self.text.replace_range(..n, replacement);
    }

    fn remove_particle(&mut self) {
        if PARTICLES.iter().any(|p| self.text.ends_with(p)) {
            self.drop_suffix(3);
        }
    }

    fn remove_possessive_pronoun(&mut self) {
        if self.text.ends_with("ku") || self.text.ends_with("mu") {
            self.drop_suffix(2);
        } else if self.text.ends_with("nya") {
            self.drop_suffix(3);
        }
    }

    /// meng-, peng-, di-, ter-, ke- and their assimilated forms.
    fn remove_first_order_prefix(&mut self) -> bool {
        for r in FIRST_ORDER {
            if !self.text.starts_with(r.prefix) {
                continue;
            }
            if r.before_vowel && !self.byte(r.prefix.len()).is_some_and(is_vowel) {
                continue;
            }
            self.flags.insert(r.tag);
            self.replace_prefix(r.prefix.len(), r.replacement);
            return true;
        }
        false
    }

    /// ber-, per-, pe- and the irregular bel-/pel- forms.
    fn remove_second_order_prefix(&mut self) -> bool {
        if self.text.starts_with("ber") {
            self.flags.insert(Removed::Ber);
            self.replace_prefix(3, "");
            return true;
        }
        if self.text == "belajar" {
            self.flags.insert(Removed::Ber);
            self.text = "ajar".to_string();
            return true;
        }
        // be-kerja, be-serta: consonant followed by "er" right after "be"
        if self.text.starts_with("be")
            && self.text.len() > 4
            && !self.byte(2).is_some_and(is_vowel)
            && self.byte(3) == Some(b'e')
            && self.byte(4) == Some(b'r')
        {
            self.flags.insert(Removed::Ber);
            self.replace_prefix(2, "");
            return true;
        }
        if self.text.starts_with("per") {
            self.replace_prefix(3, "");
            return true;
        }
        if self.text == "pelajar" {
            self.text = "ajar".to_string();
            return true;
        }
        if self.text.starts_with("pe") {
            self.flags.insert(Removed::Pe);
            self.replace_prefix(2, "");
            return true;
        }
        false
    }

    /// -kan, -an, -i, each blocked by the prefix classes it cannot combine with.
    fn remove_suffix(&mut self) -> bool {
        let flags = self.flags;
        if self.text.ends_with("kan") && !flags.contains_any(&[Removed::Ke, Removed::Peng, Removed::Pe]) {
            self.drop_suffix(3);
            return true;
        }
        if self.text.ends_with("an") && !flags.contains_any(&[Removed::Di, Removed::Meng, Removed::Ter]) {
            self.drop_suffix(2);
            return true;
        }
        if self.text.ends_with('i')
            && !self.text.ends_with("si")
            && !flags.contains_any(&[Removed::Ber, Removed::Ke, Removed::Peng])
        {
            self.drop_suffix(1);
            return true;
        }
        false
    }

    fn remove_derivational(&mut self) {
        let first_order = self.strippable() && self.remove_first_order_prefix();
        if first_order {
            let suffix = self.strippable() && self.remove_suffix();
            if suffix && self.strippable() {
                self.remove_second_order_prefix();
            }
        } else {
            if self.strippable() {
                self.remove_second_order_prefix();
            }
            if self.strippable() {
                self.remove_suffix();
            }
        }
    }
}

/// Reduce a lowercase Indonesian word to its root.
pub fn stem(word: &str) -> String {
    if !word.is_ascii() {
        return word.to_string();
    }
    let mut w = Word { text: word.to_string(), flags: Flags::default() };
    if w.strippable() {
        w.remove_particle();
    }
    if w.strippable() {
        w.remove_possessive_pronoun();
    }
    w.remove_derivational();
    w.text
}
