use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Translation providers expect ISO 639-1 codes ("en", "fa"); users and
/// config files may also give ISO 639-2 codes in either the T or B form.
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their 639-2/T form
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Resolve any supported code form to a language
fn resolve(code: &str) -> Option<(Language, LanguageCodeType)> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code).map(|l| (l, LanguageCodeType::Part1)),
        3 => Language::from_639_3(&normalized_code)
            .map(|l| (l, LanguageCodeType::Part2T))
            .or_else(|| {
                part2b_to_part2t(&normalized_code)
                    .and_then(Language::from_639_3)
                    .map(|l| (l, LanguageCodeType::Part2B))
            }),
        _ => None,
    }
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    resolve(code)
        .map(|(_, kind)| kind)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1(code: &str) -> Result<String> {
    let (lang, _) =
        resolve(code).ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(lang
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (resolve(code1), resolve(code2)) {
        (Some((a, _)), Some((b, _))) => a == b,
        _ => false,
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    resolve(code)
        .map(|(lang, _)| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validateLanguageCode_shouldClassifyForms() {
        assert_eq!(validate_language_code("fa").unwrap(), LanguageCodeType::Part1);
        assert_eq!(validate_language_code("fas").unwrap(), LanguageCodeType::Part2T);
        assert_eq!(validate_language_code("per").unwrap(), LanguageCodeType::Part2B);
        assert!(validate_language_code("xx").is_err());
        assert!(validate_language_code("english").is_err());
    }

    #[test]
    fn test_normalizeToPart1_shouldMapEveryForm() {
        assert_eq!(normalize_to_part1(" EN ").unwrap(), "en");
        assert_eq!(normalize_to_part1("eng").unwrap(), "en");
        assert_eq!(normalize_to_part1("per").unwrap(), "fa");
        assert!(normalize_to_part1("zz").is_err());
    }

    #[test]
    fn test_languageCodesMatch_shouldCompareAcrossForms() {
        assert!(language_codes_match("fa", "per"));
        assert!(language_codes_match("de", "ger"));
        assert!(!language_codes_match("en", "fa"));
        assert!(!language_codes_match("en", "bogus"));
    }

    #[test]
    fn test_getLanguageName_shouldReturnEnglishName() {
        assert_eq!(get_language_name("fa").unwrap(), "Persian");
        assert_eq!(get_language_name("en").unwrap(), "English");
    }
}
