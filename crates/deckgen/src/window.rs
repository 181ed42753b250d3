//! Windowing: select the next bounded run of sections to present as
//! source context for one generation call, without splitting a top-level
//! section across windows.

use crate::article::Section;

/// Select a prefix of `sections` as the next source window.
///
/// Phase 1 accumulates from the front until the character budget
/// (`min_chars`) is met or the next section would start a new top-level
/// section. Phase 2 looks ahead: a level-1 boundary within
/// `lookahead_chars` pulls everything before it into the window, so a
/// near-empty remainder is not left for the next call.
///
/// The caller removes the returned prefix from the pool.
pub fn sections_until_threshold<'a>(
    sections: &'a [Section],
    min_chars: usize,
    lookahead_chars: usize,
) -> &'a [Section] {
    let mut count = 0;
    let mut total_chars = 0;
    for section in sections {
        if (section.level == 1 && count > 0) || total_chars >= min_chars {
            break;
        }
        count += 1;
        total_chars += section.char_len();
    }

    let rest = &sections[count..];
    let mut chars_until_level1 = 0;
    for (i, next) in rest.iter().enumerate() {
        if chars_until_level1 > lookahead_chars {
            break;
        }
        if next.level == 1 {
            count += i;
            break;
        }
        chars_until_level1 += next.char_len();
    }

    &sections[..count]
}
