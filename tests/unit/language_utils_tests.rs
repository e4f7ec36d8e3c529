/*!
 * Tests for ISO language code helpers
 */

use anyhow::Result;
use bilinguo::language_utils::{self, LanguageCodeType};

/// Test matching between the different code forms of one language
#[test]
fn test_languageCodesMatch_acrossForms_shouldMatch() {
    let cases = [("en", "eng"), ("fa", "per"), ("fas", "per"), ("de", "ger"), ("FR", "fra")];

    for (a, b) in cases {
        assert!(language_utils::language_codes_match(a, b), "{} vs {}", a, b);
    }
    assert!(!language_utils::language_codes_match("en", "fa"));
    assert!(!language_utils::language_codes_match("en", "zz"));
}

/// Test normalization to the two-letter form used by providers
#[test]
fn test_normalizeToPart1_shouldPreferTwoLetterCodes() -> Result<()> {
    assert_eq!(language_utils::normalize_to_part1("per")?, "fa");
    assert_eq!(language_utils::normalize_to_part1("deu")?, "de");
    assert_eq!(language_utils::normalize_to_part1("es")?, "es");
    assert!(language_utils::normalize_to_part1("").is_err());
    Ok(())
}

/// Test validation results for each code form
#[test]
fn test_validateLanguageCode_shouldReportCodeType() -> Result<()> {
    assert_eq!(language_utils::validate_language_code("en")?, LanguageCodeType::Part1);
    assert_eq!(language_utils::validate_language_code("fre")?, LanguageCodeType::Part2B);
    assert_eq!(language_utils::get_language_name("fa")?, "Persian");
    Ok(())
}
