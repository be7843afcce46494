//! CLI configuration

pub(crate) mod checkout;
pub(crate) mod logging;
pub(crate) mod storage;
