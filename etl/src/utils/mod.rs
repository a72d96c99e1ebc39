pub mod frame;

#[cfg(test)]
pub mod testing;
