/// Cleans raw chat text before it is stored.
///
/// Implementations are pure: the same input always yields the same output.
pub trait Sanitizer: Send + Sync {
    fn clean(&self, input: &str) -> String;
}
