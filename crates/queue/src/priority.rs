/// Scheduling priority of a queued task. Higher values run first.
///
/// The three named levels cover every caller in the workspace, but any
/// `i32` is accepted for finer-grained ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(i32);

impl Priority {
    pub const LOW: Self = Self(0);
    pub const NORMAL: Self = Self(1);
    pub const HIGH: Self = Self(2);

    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }
}
impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}
impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_levels_are_ordered() {
        assert!(Priority::HIGH > Priority::NORMAL);
        assert!(Priority::NORMAL > Priority::LOW);
        assert_eq!(Priority::default(), Priority::NORMAL);
        assert!(Priority::from(-5) < Priority::LOW);
    }
}
