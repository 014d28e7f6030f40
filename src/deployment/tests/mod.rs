//! Unit tests for deployment workflow orchestration.

mod catalog_tests;
