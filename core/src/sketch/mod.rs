pub mod types;
pub mod plane;
pub mod query;
pub mod snap;
pub mod inference;
pub mod measurement;
pub mod dimension;
pub mod pattern;
pub mod tools;

#[cfg(test)]
mod tests_rectangle;

#[cfg(test)]
mod tests_circular_pattern;

#[cfg(test)]
mod tests_dimension_drag;

#[cfg(test)]
mod tests_cancel;

#[cfg(test)]
mod tests_history;
