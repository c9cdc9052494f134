//! Test suites for the frp manager daemon.

mod support;
