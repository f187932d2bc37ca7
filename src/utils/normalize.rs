/// Canonicalize a free-text player name for identity matching: trim, collapse
/// whitespace runs (including non-breaking spaces), and transliterate accented
/// letters to their ASCII base. Casing and word order are preserved.
///
/// Pure and infallible; empty input yields an empty string.
pub fn normalize_player_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;

    for ch in name.trim().chars() {
        let ch = if ch == '\u{00A0}' { ' ' } else { ch };
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        fold_char(ch, &mut out);
    }

    out
}

// Covers the Latin-1 Supplement and Latin Extended-A letters that show up in
// tour player names (Djokovic, Cilic, Muller, Auger-Aliassime, ...). Anything
// unmapped passes through unchanged.
fn fold_char(ch: char, out: &mut String) {
    let folded: &str = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'ç' | 'ć' | 'č' | 'ĉ' => "c",
        'Ç' | 'Ć' | 'Č' | 'Ĉ' => "C",
        'ď' | 'đ' => "d",
        'Ď' | 'Đ' => "D",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'ğ' | 'ģ' => "g",
        'Ğ' | 'Ģ' => "G",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'İ' => "I",
        'ķ' => "k",
        'ļ' | 'ľ' | 'ł' => "l",
        'Ļ' | 'Ľ' | 'Ł' => "L",
        'ñ' | 'ń' | 'ņ' | 'ň' => "n",
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ő' | 'ō' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ő' | 'Ō' => "O",
        'ŕ' | 'ř' => "r",
        'Ŕ' | 'Ř' => "R",
        'ś' | 'ş' | 'š' | 'ș' => "s",
        'Ś' | 'Ş' | 'Š' | 'Ș' => "S",
        'ť' | 'ţ' | 'ț' => "t",
        'Ť' | 'Ţ' | 'Ț' => "T",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' => "Y",
        'ź' | 'ż' | 'ž' => "z",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "Ae",
        'œ' => "oe",
        'Œ' => "Oe",
        other => {
            out.push(other);
            return;
        }
    };
    out.push_str(folded);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_collapses_whitespace() {
        assert_eq!(normalize_player_name("  Rafael   Nadal "), "Rafael Nadal");
        assert_eq!(
            normalize_player_name("Carlos\u{00A0}\u{00A0}Alcaraz"),
            "Carlos Alcaraz"
        );
        assert_eq!(normalize_player_name("Jannik\tSinner"), "Jannik Sinner");
    }

    #[test]
    fn transliterates_diacritics() {
        assert_eq!(normalize_player_name("Novak Đoković"), "Novak Dokovic");
        assert_eq!(normalize_player_name("Marin Čilić"), "Marin Cilic");
        assert_eq!(normalize_player_name("Gaël Monfils"), "Gael Monfils");
        assert_eq!(normalize_player_name("Müller"), "Muller");
        assert_eq!(normalize_player_name("Björn Borg"), "Bjorn Borg");
    }

    #[test]
    fn preserves_casing_and_punctuation() {
        assert_eq!(
            normalize_player_name("Felix Auger-Aliassime"),
            "Felix Auger-Aliassime"
        );
        assert_eq!(normalize_player_name("Alex de Minaur"), "Alex de Minaur");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize_player_name(""), "");
        assert_eq!(normalize_player_name("   "), "");
    }
}
