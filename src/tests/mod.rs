// Solscan's Test Infrastructure
//
// Component tests run against in-memory doubles (FakeToolchain) or small shell
// scripts standing in for the engine and compiler tools (FakeTools), so no real
// Slither or solc installation is needed.

// ============================================================================
// TEST HELPERS - Temp directories, fake tools, test configs
// ============================================================================
pub mod helpers;



// ============================================================================
// ENGINE TESTS - Process runner, JSON extraction, timeouts
// ============================================================================
pub mod engine_tests;
