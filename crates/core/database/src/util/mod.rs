pub mod normalise;

#[cfg(test)]
pub mod test_fixtures;
