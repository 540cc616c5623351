pub(crate) mod factories;
