//! Scans a raw FIX byte buffer into `(tag, value)` tokens in document order.
//!
//! Equivalent to matching `(\d+)=([^\x01]*)\x01` against the buffer, but
//! hand-rolled rather than pulling in a regex engine for a single linear
//! scan: no per-token allocation, `value` borrows straight from the input.

pub const SOH: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken<'a> {
    pub tag: u32,
    pub value: &'a str,
}

pub struct Tokenizer<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Tokenizer { buf, pos: 0 }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = RawToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.pos >= self.buf.len() {
                return None;
            }

            let field_start = self.pos;
            let eq_pos = match self.buf[field_start..].iter().position(|&b| b == b'=') {
                Some(offset) => field_start + offset,
                None => {
                    // no '=' left at all: nothing more can be tokenized.
                    self.pos = self.buf.len();
                    return None;
                }
            };
            let soh_pos = match self.buf[eq_pos..].iter().position(|&b| b == SOH) {
                Some(offset) => eq_pos + offset,
                None => {
                    // trailing unterminated field: ignored per spec.
                    self.pos = self.buf.len();
                    return None;
                }
            };

            let tag_bytes = &self.buf[field_start..eq_pos];
            self.pos = soh_pos + 1;

            let tag = match std::str::from_utf8(tag_bytes).ok().and_then(|s| s.parse::<u32>().ok()) {
                Some(tag) => tag,
                // not a valid digit run immediately before '=': skip ahead past
                // this SOH and keep scanning, per "malformed token... silently
                // skipped by the tokenizer".
                None => continue,
            };

            let value = std::str::from_utf8(&self.buf[eq_pos + 1..soh_pos]).unwrap_or("");
            return Some(RawToken { tag, value });
        }
    }
}
