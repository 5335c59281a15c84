//! Character-by-character text reveal.
//!
//! Markup tags (`<b>`, `<color=red>`, ...) are revealed atomically: when a
//! tick would stop inside a tag, the reveal runs on to the closing `>` at no
//! extra time cost.

pub const DEFAULT_CHARS_PER_SECOND: f32 = 45.0;

#[derive(Debug, Clone, Default)]
pub struct Typewriter {
    chars: Vec<char>,
    visible: usize,
    timer: f32,
    chars_per_second: f32,
    revealed: bool,
    signalled: bool,
}

impl Typewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets progress and begins revealing `text`.
    ///
    /// A non-positive speed reveals everything at once. Returns `true` when
    /// that instant reveal completed the text, which is the one completion
    /// signal for this run.
    pub fn start(&mut self, text: &str, chars_per_second: f32) -> bool {
        self.chars = text.chars().collect();
        self.visible = 0;
        self.timer = 0.0;
        self.chars_per_second = chars_per_second;
        self.revealed = false;
        self.signalled = false;

        if chars_per_second <= 0.0 || self.chars.is_empty() {
            return self.rush();
        }
        false
    }

    /// Advances the reveal by `dt` seconds. Returns `true` exactly once per
    /// `start`, on the tick that completes the text.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.revealed {
            return false;
        }

        self.timer += dt.max(0.0);
        let budget = self.timer * self.chars_per_second;
        if budget >= 1.0 {
            let from = self.visible;
            self.visible += budget.floor() as usize;
            self.timer = 0.0;
            self.close_open_tag(from);
        }

        if self.visible >= self.chars.len() {
            return self.finish();
        }
        false
    }

    /// Reveals the remaining text immediately. Idempotent; returns `true` only
    /// if this call is what completed the text.
    pub fn rush(&mut self) -> bool {
        if self.revealed {
            return false;
        }
        self.finish()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn visible_chars(&self) -> usize {
        self.visible
    }

    pub fn total_chars(&self) -> usize {
        self.chars.len()
    }

    pub fn visible_text(&self) -> String {
        self.chars[..self.visible].iter().collect()
    }

    pub fn full_text(&self) -> String {
        self.chars.iter().collect()
    }

    fn finish(&mut self) -> bool {
        self.visible = self.chars.len();
        self.revealed = true;
        if self.signalled {
            return false;
        }
        self.signalled = true;
        tracing::trace!("typewriter finished {} chars", self.chars.len());
        true
    }

    fn close_open_tag(&mut self, from: usize) {
        let end = self.visible.min(self.chars.len());
        let Some(open) = self.chars[from..end].iter().rposition(|c| *c == '<') else {
            return;
        };
        let open = from + open;
        if self.chars[open..end].contains(&'>') {
            return;
        }
        self.visible = match self.chars[end..].iter().position(|c| *c == '>') {
            Some(close) => end + close + 1,
            None => self.chars.len(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveals_at_fixed_rate_and_signals_once() {
        let mut typewriter = Typewriter::new();
        typewriter.start("Hello", 10.0);

        let signals: Vec<bool> = (0..5).map(|_| typewriter.tick(0.1)).collect();
        assert_eq!(signals, vec![false, false, false, false, true]);
        assert_eq!(typewriter.visible_text(), "Hello");
        assert!(!typewriter.tick(0.1));
    }

    #[test]
    fn partial_interval_reveals_nothing() {
        let mut typewriter = Typewriter::new();
        typewriter.start("abc", 4.0);
        assert!(!typewriter.tick(0.1));
        assert_eq!(typewriter.visible_chars(), 0);
        assert!(!typewriter.tick(0.2));
        assert_eq!(typewriter.visible_chars(), 1);
    }

    #[test]
    fn tags_are_never_split() {
        let mut typewriter = Typewriter::new();
        typewriter.start("a<b>c", 10.0);

        typewriter.tick(0.1);
        assert_eq!(typewriter.visible_text(), "a");
        typewriter.tick(0.1);
        assert_eq!(typewriter.visible_text(), "a<b>");
        assert!(typewriter.tick(0.1));
        assert_eq!(typewriter.visible_text(), "a<b>c");
    }

    #[test]
    fn tags_stay_whole_at_any_speed_and_frame_rate() {
        for chars_per_second in [0.5, 3.0, 10.0, 45.0, 200.0] {
            for dt in [1.0 / 60.0, 0.07, 0.25, 1.0] {
                let mut typewriter = Typewriter::new();
                typewriter.start("a<b>c", chars_per_second);
                let mut signals = 0;
                for _ in 0..2000 {
                    if typewriter.tick(dt) {
                        signals += 1;
                    }
                    let visible = typewriter.visible_text();
                    assert!(
                        visible != "a<" && visible != "a<b",
                        "{visible:?} at {chars_per_second} chars/s, dt {dt}"
                    );
                }
                assert_eq!(signals, 1, "at {chars_per_second} chars/s, dt {dt}");
                assert_eq!(typewriter.visible_text(), "a<b>c");
            }
        }
    }

    #[test]
    fn unterminated_tag_reveals_to_the_end() {
        let mut typewriter = Typewriter::new();
        typewriter.start("x<oops", 10.0);
        typewriter.tick(0.1);
        assert!(typewriter.tick(0.1));
        assert_eq!(typewriter.visible_text(), "x<oops");
    }

    #[test]
    fn rush_is_idempotent() {
        let mut typewriter = Typewriter::new();
        typewriter.start("Hello", 10.0);
        typewriter.tick(0.2);

        assert!(typewriter.rush());
        assert!(!typewriter.rush());
        assert!(!typewriter.tick(1.0));
        assert_eq!(typewriter.visible_text(), "Hello");
    }

    #[test]
    fn non_positive_speed_completes_at_start() {
        let mut typewriter = Typewriter::new();
        assert!(typewriter.start("instant", 0.0));
        assert!(typewriter.is_revealed());
        assert!(!typewriter.rush());
    }

    #[test]
    fn counts_unicode_scalars() {
        let mut typewriter = Typewriter::new();
        typewriter.start("héllo", 10.0);
        typewriter.tick(0.2);
        assert_eq!(typewriter.visible_text(), "hé");
    }

    #[test]
    fn restart_resets_progress() {
        let mut typewriter = Typewriter::new();
        typewriter.start("ab", 0.0);
        assert!(!typewriter.start("cd", 10.0));
        assert_eq!(typewriter.visible_chars(), 0);
        assert!(!typewriter.is_revealed());
    }
}
