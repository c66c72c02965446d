//! Canvas rendering for the repository graph.
//!
//! Passes, back to front:
//! 1. Background (screen space)
//! 2. Edges with their pushed opacity, dashed dependency edges and arrowheads
//! 3. Nodes by shape, then labels, then the hover ring

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::layout::NodeShape;
use super::state::{BOX_HALF_HEIGHT, BOX_HALF_WIDTH, ForceLayout, NodeSlot};
use super::theme::{Theme, palette};

const ARROW_SIZE: f64 = 8.0;
const DASH: (f64, f64) = (6.0, 4.0);
/// Dash offset speed, world units per second.
const DASH_FLOW: f64 = 12.0;

/// Renders the complete graph to the canvas.
pub fn render(layout: &ForceLayout, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	draw_background(layout, ctx, theme);

	ctx.save();
	let _ = ctx.translate(layout.transform.x, layout.transform.y);
	let _ = ctx.scale(layout.transform.k, layout.transform.k);

	if layout.edges_visible() {
		draw_edges(layout, ctx);
	}
	draw_nodes(layout, ctx, theme);

	ctx.restore();
}

fn draw_background(layout: &ForceLayout, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let (w, h) = (layout.width, layout.height);
	let gradient = theme
		.background
		.use_gradient
		.then(|| ctx.create_radial_gradient(w / 2.0, h / 2.0, 0.0, w / 2.0, h / 2.0, w.max(h) * 0.8).ok())
		.flatten();

	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &theme.background.color_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &theme.background.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&theme.background.color.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, w, h);
}

fn draw_edges(layout: &ForceLayout, ctx: &CanvasRenderingContext2d) {
	let dash_offset = -layout.flow_time * DASH_FLOW;

	layout.visit_edges(|edge, (x1, y1), (x2, y2)| {
		let style = &edge.attrs.style;
		if style.opacity <= 0.0 {
			return;
		}
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = dx.hypot(dy);
		if dist < 0.001 {
			return;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let color = style.color.fade(style.opacity).to_css();

		let inset = layout
			.slot(&edge.target)
			.map_or(0.0, |slot| outline_distance(layout, slot, ux, uy));
		let head = if edge.attrs.arrow { ARROW_SIZE } else { 0.0 };

		ctx.set_stroke_style_str(&color);
		ctx.set_line_width(style.width);
		if edge.attrs.dashed {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(DASH.0),
				&JsValue::from_f64(DASH.1),
			));
			ctx.set_line_dash_offset(dash_offset);
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2 - ux * (inset + head), y2 - uy * (inset + head));
		ctx.stroke();

		if edge.attrs.arrow {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
			ctx.set_fill_style_str(&color);
			let (tip_x, tip_y) = (x2 - ux * inset, y2 - uy * inset);
			let (back_x, back_y) = (tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);
			let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);

			ctx.begin_path();
			ctx.move_to(tip_x, tip_y);
			ctx.line_to(back_x + px, back_y + py);
			ctx.line_to(back_x - px, back_y - py);
			ctx.close_path();
			ctx.fill();
		}
	});

	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

/// Distance from a node's center to its outline along direction `(ux, uy)`.
fn outline_distance(layout: &ForceLayout, slot: &NodeSlot, ux: f64, uy: f64) -> f64 {
	match slot.shape {
		NodeShape::Box => {
			let tx = if ux.abs() > 1e-9 { BOX_HALF_WIDTH / ux.abs() } else { f64::INFINITY };
			let ty = if uy.abs() > 1e-9 { BOX_HALF_HEIGHT / uy.abs() } else { f64::INFINITY };
			tx.min(ty)
		}
		_ => layout.radius_for(slot.style.size),
	}
}

fn draw_nodes(layout: &ForceLayout, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let k = layout.transform.k;
	let border_width = theme.border_width / k.max(0.5);
	let show_labels = k >= theme.label.min_zoom;

	// Pass 1: shapes
	layout.visit_nodes(|_, slot, x, y| {
		let radius = layout.radius_for(slot.style.size);
		trace_shape(ctx, slot.shape, x, y, radius);
		ctx.set_fill_style_str(&slot.style.fill.to_css());
		ctx.fill();
		ctx.set_stroke_style_str(&slot.style.border.to_css());
		ctx.set_line_width(border_width);
		ctx.stroke();
	});

	// Pass 2: labels above every shape
	if show_labels {
		layout.visit_nodes(|_, slot, x, y| {
			draw_label(layout, ctx, theme, slot, x, y);
		});
	}

	// Pass 3: hover ring
	if let Some(id) = layout.hovered.as_deref() {
		if let (Some(slot), Some((x, y))) = (layout.slot(id), layout.position(id)) {
			let ring = palette::WHITE.lerp(slot.style.fill.with_alpha(1.0), 0.3).with_alpha(0.8);
			let radius = layout.radius_for(slot.style.size) + 4.0 / k.max(0.5);
			trace_shape(ctx, slot.shape, x, y, radius);
			ctx.set_stroke_style_str(&ring.to_css());
			ctx.set_line_width(border_width);
			ctx.stroke();
		}
	}
}

fn draw_label(
	layout: &ForceLayout,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	slot: &NodeSlot,
	x: f64,
	y: f64,
) {
	if slot.label.is_empty() || slot.style.font_color.a < 0.05 {
		return;
	}
	ctx.set_font(&format!("{}px {}", slot.style.font_size, theme.label.font_family));
	ctx.set_fill_style_str(&slot.style.font_color.to_css());
	ctx.set_text_align("center");
	match slot.shape {
		NodeShape::Box => {
			ctx.set_text_baseline("middle");
			let _ = ctx.fill_text_with_max_width(&slot.label, x, y, BOX_HALF_WIDTH * 2.0 - 8.0);
		}
		_ => {
			ctx.set_text_baseline("top");
			let radius = layout.radius_for(slot.style.size);
			let _ = ctx.fill_text(&slot.label, x, y + radius + 4.0);
		}
	}
	ctx.set_text_baseline("alphabetic");
	ctx.set_text_align("start");
}

/// Begin a path outlining `shape` centered on `(x, y)`.
fn trace_shape(ctx: &CanvasRenderingContext2d, shape: NodeShape, x: f64, y: f64, radius: f64) {
	ctx.begin_path();
	match shape {
		NodeShape::Dot => {
			let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		}
		NodeShape::Hexagon => {
			for i in 0..6 {
				let angle = PI / 3.0 * i as f64 - PI / 6.0;
				let (px, py) = (x + radius * angle.cos(), y + radius * angle.sin());
				if i == 0 {
					ctx.move_to(px, py);
				} else {
					ctx.line_to(px, py);
				}
			}
			ctx.close_path();
		}
		NodeShape::Box => {
			rounded_rect(ctx, x - BOX_HALF_WIDTH, y - BOX_HALF_HEIGHT, BOX_HALF_WIDTH * 2.0, BOX_HALF_HEIGHT * 2.0, 6.0);
		}
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.move_to(x + r, y);
	ctx.line_to(x + w - r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + r, r);
	ctx.line_to(x + w, y + h - r);
	let _ = ctx.arc_to(x + w, y + h, x + w - r, y + h, r);
	ctx.line_to(x + r, y + h);
	let _ = ctx.arc_to(x, y + h, x, y + h - r, r);
	ctx.line_to(x, y + r);
	let _ = ctx.arc_to(x, y, x + r, y, r);
	ctx.close_path();
}
