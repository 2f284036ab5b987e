use bitflags::bitflags;

bitflags! {
    /// Access mode of a [`crate::Dataset`], as reported by [`crate::Dataset::access`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GdalOpenFlags: u32 {
        /// Read-only (default).
        const GDAL_OF_READONLY = 0x00;
        /// Update mode.
        const GDAL_OF_UPDATE = 0x01;
        /// Multidimensional raster dataset.
        const GDAL_OF_MULTIDIM_RASTER = 0x10;
    }
}

impl Default for GdalOpenFlags {
    fn default() -> GdalOpenFlags {
        GdalOpenFlags::GDAL_OF_READONLY
    }
}

impl GdalOpenFlags {
    pub(crate) fn multidim(writable: bool) -> GdalOpenFlags {
        if writable {
            GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_MULTIDIM_RASTER
        } else {
            GdalOpenFlags::GDAL_OF_READONLY | GdalOpenFlags::GDAL_OF_MULTIDIM_RASTER
        }
    }

    pub fn is_update(&self) -> bool {
        self.contains(GdalOpenFlags::GDAL_OF_UPDATE)
    }
}
