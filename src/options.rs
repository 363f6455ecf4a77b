use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::model::SectionVisibility;

/// Fixed page layout constants, all in points. `y` grows downward from the page top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub left_margin: f32,
    pub right_margin: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub line_height: f32,
    pub section_gap: f32,
    pub entry_gap: f32,
    pub paragraph_gap: f32,
}

const MM: f32 = 72.0 / 25.4;

impl PageGeometry {
    pub fn a4() -> Self {
        PageGeometry {
            page_width: 210.0 * MM,
            page_height: 297.0 * MM,
            ..Self::with_page(0.0, 0.0)
        }
    }

    pub fn letter() -> Self {
        Self::with_page(612.0, 792.0)
    }

    /// A page of the given size with the default 20mm margins and spacing.
    pub fn with_page(page_width: f32, page_height: f32) -> Self {
        PageGeometry {
            page_width,
            page_height,
            left_margin: 20.0 * MM,
            right_margin: 20.0 * MM,
            top_margin: 20.0 * MM,
            bottom_margin: 20.0 * MM,
            line_height: 14.0,
            section_gap: 14.0,
            entry_gap: 8.0,
            paragraph_gap: 4.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - self.left_margin - self.right_margin
    }

    /// Lowest `y` content may reach before a page break is required.
    pub fn content_bottom(&self) -> f32 {
        self.page_height - self.bottom_margin
    }

    pub fn usable_height(&self) -> f32 {
        self.content_bottom() - self.top_margin
    }

    pub fn validate(&self) -> Result<(), Error> {
        let values = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("left_margin", self.left_margin),
            ("right_margin", self.right_margin),
            ("top_margin", self.top_margin),
            ("bottom_margin", self.bottom_margin),
            ("line_height", self.line_height),
            ("section_gap", self.section_gap),
            ("entry_gap", self.entry_gap),
            ("paragraph_gap", self.paragraph_gap),
        ];
        for (name, v) in values {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::InvalidGeometry(format!("{name} must be a non-negative number, got {v}")));
            }
        }
        if self.line_height <= 0.0 {
            return Err(Error::InvalidGeometry("line_height must be positive".into()));
        }
        if self.content_width() <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "margins leave no horizontal space ({:.1}pt)",
                self.content_width()
            )));
        }
        if self.usable_height() <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "margins leave no vertical space ({:.1}pt)",
                self.usable_height()
            )));
        }
        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Font sizes (points) of the fixed text styles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Typography {
    pub name_size: f32,
    pub contact_size: f32,
    pub heading_size: f32,
    pub body_size: f32,
    pub accent: [u8; 3],
}

impl Typography {
    /// Line pitch for `size`, scaled from the geometry's body line height.
    pub fn line_height_for(&self, geometry: &PageGeometry, size: f32) -> f32 {
        geometry.line_height * size / self.body_size
    }

    /// Every size must be a positive, finite point value.
    pub fn validate(&self) -> Result<(), Error> {
        let sizes = [
            ("name_size", self.name_size),
            ("contact_size", self.contact_size),
            ("heading_size", self.heading_size),
            ("body_size", self.body_size),
        ];
        for (name, v) in sizes {
            if !v.is_finite() || v <= 0.0 {
                return Err(Error::InvalidOptions(format!("{name} must be a positive number, got {v}")));
            }
        }
        Ok(())
    }
}

impl Default for Typography {
    fn default() -> Self {
        Typography {
            name_size: 22.0,
            contact_size: 10.0,
            heading_size: 14.0,
            body_size: 11.0,
            accent: [99, 102, 241],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PortraitOptions {
    pub enabled: bool,
    /// Side of the square box the photo is fitted into.
    pub box_size: f32,
    /// Upper bound on the fetch (connect + transfer).
    pub timeout: Duration,
}

impl PortraitOptions {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.box_size.is_finite() || self.box_size < 0.0 {
            return Err(Error::InvalidOptions(format!(
                "portrait box_size must be a non-negative number, got {}",
                self.box_size
            )));
        }
        Ok(())
    }
}

impl Default for PortraitOptions {
    fn default() -> Self {
        PortraitOptions {
            enabled: true,
            box_size: 85.0,
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum FontSource {
    /// PDF standard Helvetica / Helvetica-Bold, not embedded.
    #[default]
    Standard,
    /// TrueType/OpenType files, subsetted and embedded. Bold falls back to regular.
    TrueType {
        regular: PathBuf,
        bold: Option<PathBuf>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    pub geometry: PageGeometry,
    pub typography: Typography,
    /// Flags set here override the profile's own section visibility.
    pub visibility: SectionVisibility,
    pub max_projects: usize,
    pub include_project_descriptions: bool,
    pub portrait: PortraitOptions,
    pub fonts: FontSource,
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), Error> {
        self.geometry.validate()?;
        self.typography.validate()?;
        self.portrait.validate()
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            geometry: PageGeometry::default(),
            typography: Typography::default(),
            visibility: SectionVisibility::default(),
            max_projects: 5,
            include_project_descriptions: false,
            portrait: PortraitOptions::default(),
            fonts: FontSource::Standard,
        }
    }
}
