// Note names for display and for parsing tonic arguments.

const NOTE_NAMES_SHARP: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
const NOTE_NAMES_FLAT: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];

pub fn note_name(pitch_class: u8, use_flats: bool) -> &'static str {
    let idx = (pitch_class % 12) as usize;
    if use_flats {
        NOTE_NAMES_FLAT[idx]
    } else {
        NOTE_NAMES_SHARP[idx]
    }
}

/// Name with octave, MIDI 60 = C4.
pub fn pitch_name(pitch: u8, use_flats: bool) -> String {
    let octave = pitch as i16 / 12 - 1;
    format!("{}{}", note_name(pitch % 12, use_flats), octave)
}

/// Parse a note name such as "C", "f#", "Bb" or a bare pitch class "0".."11".
pub fn parse_pitch_class(name: &str) -> Option<u8> {
    let name = name.trim();
    if let Ok(n) = name.parse::<u8>() {
        return (n < 12).then_some(n);
    }

    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base: i16 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let mut offset: i16 = 0;
    for c in chars {
        match c {
            '#' | 's' => offset += 1,
            'b' => offset -= 1,
            _ => return None,
        }
    }
    Some((base + offset).rem_euclid(12) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(1, false), "C#");
        assert_eq!(note_name(1, true), "Db");
        assert_eq!(note_name(14, false), "D");
        assert_eq!(pitch_name(60, false), "C4");
        assert_eq!(pitch_name(70, true), "Bb4");
    }

    #[test]
    fn test_parse_pitch_class() {
        assert_eq!(parse_pitch_class("C"), Some(0));
        assert_eq!(parse_pitch_class("f#"), Some(6));
        assert_eq!(parse_pitch_class("Bb"), Some(10));
        assert_eq!(parse_pitch_class("Cb"), Some(11));
        assert_eq!(parse_pitch_class("7"), Some(7));
        assert_eq!(parse_pitch_class("12"), None);
        assert_eq!(parse_pitch_class("H"), None);
        assert_eq!(parse_pitch_class(""), None);
    }
}
