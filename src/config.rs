//! Configuration for fdstore
//!
//! Page geometry and decode/update behaviour chosen at mount time.

/// Default page size in words of the nRF52 family
pub const NRF52_VIRTUAL_PAGE_SIZE: usize = 1024;

/// Default number of virtual pages (one swap page plus two data pages)
pub const NRF52_VIRTUAL_PAGES: usize = 3;

/// Main configuration for a record store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------
    /// Page size in 32-bit words. `None` means infer it from the image.
    pub virtual_page_size: Option<usize>,

    /// Number of pages. `None` means derive it from the image length.
    pub virtual_pages: Option<usize>,

    // -------------------------------------------------------------------------
    // Decode
    // -------------------------------------------------------------------------
    /// Verify record CRCs while mounting
    pub crc_check: bool,

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------
    /// How `update_record` maps onto the slot sequence
    pub update_mode: UpdateMode,
}

/// Update strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Replace the data of the existing record, keeping its id and position
    #[default]
    InPlace,

    /// Tombstone the old slot and append a new record with a fresh id
    Append,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            virtual_page_size: None,
            virtual_pages: None,
            crc_check: false,
            update_mode: UpdateMode::InPlace,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Geometry of the default nRF52 configuration (3 pages of 1024 words)
    pub fn nrf52() -> Self {
        Self::builder()
            .virtual_page_size(NRF52_VIRTUAL_PAGE_SIZE)
            .virtual_pages(NRF52_VIRTUAL_PAGES)
            .build()
    }

    /// Total image size in bytes, if the geometry is fully known
    pub fn image_size(&self) -> Option<usize> {
        Some(self.virtual_page_size? * self.virtual_pages? * 4)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the page size in words
    pub fn virtual_page_size(mut self, words: usize) -> Self {
        self.config.virtual_page_size = Some(words);
        self
    }

    /// Set the number of pages
    pub fn virtual_pages(mut self, count: usize) -> Self {
        self.config.virtual_pages = Some(count);
        self
    }

    /// Enable or disable CRC verification on mount
    pub fn crc_check(mut self, enabled: bool) -> Self {
        self.config.crc_check = enabled;
        self
    }

    /// Set the update strategy
    pub fn update_mode(mut self, mode: UpdateMode) -> Self {
        self.config.update_mode = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
