//! Colors and canvas theming for the repository graph.
//!
//! The fixed palette mirrors the GitHub-dark scheme the backend's HTML report
//! uses, so screenshots of either look alike.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Multiply the existing alpha, keeping the hue.
	pub fn fade(self, factor: f64) -> Self {
		Self {
			a: (self.a * factor).clamp(0.0, 1.0),
			..self
		}
	}

	/// Linear interpolation between two colors
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * (1.0 - t) + other.r as f64 * t) as u8,
			g: (self.g as f64 * (1.0 - t) + other.g as f64 * t) as u8,
			b: (self.b as f64 * (1.0 - t) + other.b as f64 * t) as u8,
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Fixed palette shared by the graph, the sidebar and the table view.
pub mod palette {
	use super::Color;

	pub const HIGH: Color = Color::rgb(0xff, 0x7b, 0x72);
	pub const MEDIUM: Color = Color::rgb(0xd2, 0x99, 0x22);
	pub const LOW: Color = Color::rgb(0x3f, 0xb9, 0x50);
	pub const PACKAGE_LABEL: Color = Color::rgb(0x8b, 0x94, 0x9e);
	pub const PACKAGE_FILL: Color = Color::rgb(0x16, 0x1b, 0x22);
	pub const EDGE: Color = Color::rgb(0x30, 0x36, 0x3d);
	pub const ACCENT: Color = Color::rgb(0x58, 0xa6, 0xff);
	pub const EMPHASIS: Color = Color::rgb(0xff, 0x44, 0x44);
	pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
	pub const LABEL: Color = Color::rgb(0xf0, 0xf6, 0xfc);

	// Intent buckets
	pub const ENTRY_POINT: Color = Color::rgb(0xf7, 0x78, 0xba);
	pub const CORE_DOMAIN: Color = Color::rgb(0xa3, 0x71, 0xf7);
	pub const BUSINESS_LOGIC: Color = Color::rgb(0x58, 0xa6, 0xff);
	pub const INFRASTRUCTURE: Color = Color::rgb(0x8b, 0x94, 0x9e);
	pub const DATA_MODEL: Color = Color::rgb(0x23, 0x86, 0x36);
	pub const INTERFACE: Color = Color::rgb(0xf2, 0xcc, 0x60);
	pub const UTILITY: Color = Color::rgb(0x79, 0xc0, 0xff);
	pub const CONFIGURATION: Color = Color::rgb(0xd2, 0xa8, 0xff);
	pub const TEST: Color = Color::rgb(0xff, 0x7b, 0x72);
}

/// Background style configuration.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	/// Primary background color
	pub color: Color,
	/// Secondary color for the radial gradient center
	pub color_secondary: Color,
	pub use_gradient: bool,
}

/// Label rendering configuration.
#[derive(Clone, Debug)]
pub struct LabelStyle {
	pub font_family: &'static str,
	/// Labels are skipped below this zoom level to keep dense graphs legible.
	pub min_zoom: f64,
}

/// Complete visual theme for the canvas.
#[derive(Clone, Debug)]
pub struct Theme {
	pub background: BackgroundStyle,
	pub label: LabelStyle,
	/// Node border width in world units.
	pub border_width: f64,
	/// Radius range node `size` values are mapped onto.
	pub radius_range: (f64, f64),
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: BackgroundStyle {
				color: Color::rgb(0x0d, 0x11, 0x17),
				color_secondary: Color::rgb(0x16, 0x1b, 0x22),
				use_gradient: true,
			},
			label: LabelStyle {
				font_family: "Inter, system-ui",
				min_zoom: 0.35,
			},
			border_width: 2.0,
			radius_range: (10.0, 30.0),
		}
	}
}
