//! Builder configuration surface

/// Options controlling how containers are closed.
///
/// All fields default to `false`, matching the upstream VelocyPack default of
/// favoring random-access index tables over compact layouts and not paying
/// for a uniqueness scan unless the caller asks for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuilderOptions {
    /// Prefer the compact (unindexed) layout for arrays even when not
    /// explicitly requested via `open_array(unindexed = true)`.
    pub build_unindexed_arrays: bool,
    /// Prefer the compact (unindexed) layout for objects with more than one
    /// entry even when not explicitly requested via `open_object(unindexed = true)`.
    pub build_unindexed_objects: bool,
    /// Check for duplicate attribute names when closing an object.
    pub check_attribute_uniqueness: bool,
}

impl BuilderOptions {
    /// Returns a copy of these options with `check_attribute_uniqueness` set.
    pub fn with_check_attribute_uniqueness(mut self, value: bool) -> Self {
        self.check_attribute_uniqueness = value;
        self
    }

    /// Returns a copy of these options with `build_unindexed_arrays` set.
    pub fn with_build_unindexed_arrays(mut self, value: bool) -> Self {
        self.build_unindexed_arrays = value;
        self
    }

    /// Returns a copy of these options with `build_unindexed_objects` set.
    pub fn with_build_unindexed_objects(mut self, value: bool) -> Self {
        self.build_unindexed_objects = value;
        self
    }
}
