mod common;
mod provisioning;
mod scoring;
