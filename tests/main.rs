/*!
 * Main test entry point for the bilinguo test suite
 */

// Import common test utilities
pub mod common;

// Import unit tests
mod unit {
    // App configuration tests
    pub mod app_config_tests;

    // Language utilities tests
    pub mod language_utils_tests;
}

// Import integration tests
mod integration {
    // Provider HTTP handling against a local stub server
    pub mod provider_api_tests;

    // Import, translate, export against an on-disk store
    pub mod vocabulary_lifecycle_tests;
}
