pub(crate) mod ai;
pub(crate) mod channels;
pub(crate) mod health;
pub(crate) mod jobs;

#[cfg(test)]
pub(crate) mod test_support;
