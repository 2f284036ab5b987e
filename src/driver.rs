use crate::cpl::{self, CslStringList};
use crate::dataset::Dataset;
use crate::errors::*;
use crate::options::GdalOpenFlags;
use crate::raster::Group;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DriverKind {
    Mem,
    Array,
}

const DRIVERS: [DriverKind; 2] = [DriverKind::Mem, DriverKind::Array];

/// A format driver.
///
/// `MEM` creates in-memory multidimensional datasets. `ARRAY` is the driver of
/// datasets wrapping memory owned by the caller, see [`Dataset::open_strided_slice`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Driver {
    kind: DriverKind,
}

impl Driver {
    pub(crate) fn array() -> Driver {
        Driver {
            kind: DriverKind::Array,
        }
    }

    pub fn short_name(&self) -> String {
        match self.kind {
            DriverKind::Mem => "MEM",
            DriverKind::Array => "ARRAY",
        }
        .to_string()
    }

    pub fn long_name(&self) -> String {
        match self.kind {
            DriverKind::Mem => "In Memory multidimensional raster",
            DriverKind::Array => "Multidimensional array in caller memory",
        }
        .to_string()
    }

    /// Whether [`create_multidim`](Self::create_multidim) is available.
    pub fn can_create_multidim(&self) -> bool {
        self.kind == DriverKind::Mem
    }

    /// Create a new multidimensional dataset with an empty, writable root group.
    ///
    /// Neither driver knows any root group or creation option; unknown keys are
    /// reported as warnings and ignored.
    pub fn create_multidim(
        &self,
        name: &str,
        root_group_options: CslStringList,
        options: CslStringList,
    ) -> Result<Dataset<'static>> {
        if !self.can_create_multidim() {
            return Err(cpl::report(GdalError::NotSupported(format!(
                "driver {} does not support CreateMultiDimensional()",
                self.short_name()
            ))));
        }
        root_group_options.warn_unknown_keys(&[], "root group creation");
        options.warn_unknown_keys(&[], "CreateMultiDimensional()");

        cpl::debug("MEM", &format!("creating multidimensional dataset '{name}'"));
        Ok(Dataset::new_multidim(
            *self,
            name.to_string(),
            GdalOpenFlags::multidim(true),
            Group::new_root(true),
        ))
    }
}

/// Lookup of the available drivers.
pub struct DriverManager;

impl DriverManager {
    /// Number of registered drivers.
    pub fn count() -> usize {
        DRIVERS.len()
    }

    pub fn get_driver(index: usize) -> Result<Driver> {
        DRIVERS
            .get(index)
            .map(|&kind| Driver { kind })
            .ok_or_else(|| {
                cpl::report(GdalError::OutOfRangeMsg(format!(
                    "driver index {index} is not below {}",
                    DRIVERS.len()
                )))
            })
    }

    /// Find a driver by its short name, ignoring case.
    pub fn get_driver_by_name(name: &str) -> Result<Driver> {
        Self::all()
            .find(|d| d.short_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                cpl::report(GdalError::NotFound {
                    kind: "driver",
                    name: name.to_string(),
                })
            })
    }

    pub fn all() -> impl Iterator<Item = Driver> {
        DRIVERS.into_iter().map(|kind| Driver { kind })
    }
}
