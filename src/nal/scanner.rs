//! Annex-B start code scanning

/// Location of an Annex-B start code within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartCode {
    /// Offset of the first zero byte
    pub offset: usize,
    /// 3 for `00 00 01`, 4 for `00 00 00 01`
    pub width: usize,
}

impl StartCode {
    /// Offset of the first byte after the start code.
    pub fn end(&self) -> usize {
        self.offset + self.width
    }
}

/// Find the first start code in `buf`.
///
/// Zero runs are resolved at the earliest position that completes a code, so
/// `00 00 00 01` is reported as one 4-byte code rather than a stray `00`
/// followed by a 3-byte code. Returns `None` when the buffer ends before a
/// code completes.
pub fn find_start_code(buf: &[u8]) -> Option<StartCode> {
    let mut i = 0;
    while i + 2 < buf.len() {
        if buf[i] != 0x00 || buf[i + 1] != 0x00 {
            i += 1;
            continue;
        }
        match buf[i + 2] {
            0x01 => return Some(StartCode { offset: i, width: 3 }),
            0x00 => match buf.get(i + 3) {
                Some(0x01) => return Some(StartCode { offset: i, width: 4 }),
                None => return None,
                Some(_) => {}
            },
            _ => {}
        }
        i += 1;
    }
    None
}

/// Width of the start code beginning exactly at `pos`, if there is one.
pub fn start_code_at(buf: &[u8], pos: usize) -> Option<usize> {
    match buf.get(pos..)? {
        [0x00, 0x00, 0x01, ..] => Some(3),
        [0x00, 0x00, 0x00, 0x01, ..] => Some(4),
        _ => None,
    }
}
