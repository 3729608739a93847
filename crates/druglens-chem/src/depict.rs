//! Raster depiction of 2D coordinates as PNG.

use nalgebra::Point2;
use tiny_skia::{Color, LineCap, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::error::{ChemError, Result};
use crate::font;
use crate::molecule::{Atom, BondOrder, Molecule};
use crate::rings::RingInfo;

const MARGIN: f32 = 20.0;
/// Longest bond drawn, in pixels; small molecules are not blown up.
const MAX_BOND_PX: f32 = 40.0;
const BLACK: [u8; 3] = [0, 0, 0];

/// Text drawn on an atom, or `None` for plain skeletal carbons.
pub fn atom_label(mol: &Molecule, idx: usize) -> Option<String> {
    let atom = mol.atom(idx);
    let is_carbon = atom.element.atomic_number() == 6;
    if is_carbon && atom.charge == 0 && atom.isotope.is_none() && mol.degree(idx) > 0 {
        return None;
    }

    let mut label = String::new();
    if let Some(isotope) = atom.isotope {
        label.push_str(&isotope.to_string());
    }
    label.push_str(atom.element.symbol());
    match atom.total_h() {
        0 => {}
        1 => label.push('H'),
        n => {
            label.push('H');
            label.push_str(&n.to_string());
        }
    }
    label.push_str(&charge_text(atom));
    Some(label)
}

fn charge_text(atom: &Atom) -> String {
    match atom.charge {
        0 => String::new(),
        1 => "+".into(),
        -1 => "-".into(),
        q if q > 0 => format!("{q}+"),
        q => format!("{}-", -i16::from(q)),
    }
}

struct Canvas {
    pixmap: Pixmap,
    line_width: f32,
}

impl Canvas {
    fn line(&mut self, from: [f32; 2], to: [f32; 2], color: [u8; 3]) {
        let mut pb = PathBuilder::new();
        pb.move_to(from[0], from[1]);
        pb.line_to(to[0], to[1]);
        let Some(path) = pb.finish() else { return };
        let mut paint = Paint::default();
        paint.set_color_rgba8(color[0], color[1], color[2], 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: self.line_width,
            line_cap: LineCap::Round,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Line split at its midpoint, each half in its atom's colour.
    fn split_line(&mut self, from: [f32; 2], to: [f32; 2], colors: ([u8; 3], [u8; 3])) {
        let mid = [(from[0] + to[0]) / 2.0, (from[1] + to[1]) / 2.0];
        if colors.0 == colors.1 {
            self.line(from, to, colors.0);
        } else {
            self.line(from, mid, colors.0);
            self.line(mid, to, colors.1);
        }
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 3]) {
        let Some(rect) = Rect::from_xywh(x, y, w, h) else { return };
        let mut paint = Paint::default();
        paint.set_color_rgba8(color[0], color[1], color[2], 255);
        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    fn text(&mut self, center: [f32; 2], text: &str, scale: u32, color: [u8; 3]) {
        let width = font::text_width(text, scale) as f32;
        let height = (font::GLYPH_HEIGHT * scale) as f32;
        let x0 = (center[0] - width / 2.0).round();
        let y0 = (center[1] - height / 2.0).round();
        let pad = scale as f32;
        self.rect(x0 - pad, y0 - pad, width + 2.0 * pad, height + 2.0 * pad, [255, 255, 255]);
        for (px, py) in font::text_pixels(text, scale) {
            self.rect(x0 + px as f32, y0 + py as f32, scale as f32, scale as f32, color);
        }
    }
}

fn offset(p: [f32; 2], d: [f32; 2], k: f32) -> [f32; 2] {
    [p[0] + d[0] * k, p[1] + d[1] * k]
}

/// Draw the molecule into a `size`×`size` PNG.
pub fn depict_png(mol: &Molecule, rings: &RingInfo, coords: &[Point2<f64>], size: u32) -> Result<Vec<u8>> {
    let mut pixmap = Pixmap::new(size, size)
        .ok_or_else(|| ChemError::Render(format!("cannot allocate {size}x{size} canvas")))?;
    pixmap.fill(Color::WHITE);

    let (mut min, mut max) = ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
    for p in coords {
        for k in 0..2 {
            min[k] = min[k].min(p[k]);
            max[k] = max[k].max(p[k]);
        }
    }
    let span = (max[0] - min[0]).max(max[1] - min[1]) as f32;
    let available = size as f32 - 2.0 * MARGIN;
    let scale = if span > 0.0 { (available / span).min(MAX_BOND_PX) } else { MAX_BOND_PX };
    let center = [(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0];
    let half = size as f32 / 2.0;
    let to_px = |p: &Point2<f64>| -> [f32; 2] {
        [
            half + (p.x - center[0]) as f32 * scale,
            half - (p.y - center[1]) as f32 * scale,
        ]
    };
    let points: Vec<[f32; 2]> = coords.iter().map(to_px).collect();

    let label_scale = ((scale / 14.0) as u32).clamp(1, 3);
    let labels: Vec<Option<String>> = (0..mol.atom_count()).map(|i| atom_label(mol, i)).collect();
    let colors: Vec<[u8; 3]> = (0..mol.atom_count())
        .map(|i| if labels[i].is_some() { mol.atom(i).element.color() } else { BLACK })
        .collect();

    let mut canvas = Canvas {
        pixmap,
        line_width: (scale / 20.0).clamp(1.0, 2.5),
    };
    let clearance = (font::GLYPH_HEIGHT * label_scale) as f32 * 0.8;

    for (idx, bond) in mol.bonds().iter().enumerate() {
        let (a, b) = (bond.begin, bond.end);
        let (mut p, mut q) = (points[a], points[b]);
        let dx = q[0] - p[0];
        let dy = q[1] - p[1];
        let len = (dx * dx + dy * dy).sqrt();
        if len < 1e-3 {
            continue;
        }
        let dir = [dx / len, dy / len];
        let normal = [-dir[1], dir[0]];
        if labels[a].is_some() {
            p = offset(p, dir, clearance.min(len * 0.4));
        }
        if labels[b].is_some() {
            q = offset(q, dir, -clearance.min(len * 0.4));
        }
        let pair = (colors[a], colors[b]);
        let gap = len * 0.18;

        match bond.order {
            BondOrder::Double if rings.bond_in_ring(idx) => {
                canvas.split_line(p, q, pair);
                let inward = ring_side(rings, idx, &points, p, normal);
                let inset = len * 0.15;
                let p2 = offset(offset(p, normal, gap * inward), dir, inset);
                let q2 = offset(offset(q, normal, gap * inward), dir, -inset);
                canvas.split_line(p2, q2, pair);
            }
            BondOrder::Double => {
                let h = gap / 2.0;
                canvas.split_line(offset(p, normal, h), offset(q, normal, h), pair);
                canvas.split_line(offset(p, normal, -h), offset(q, normal, -h), pair);
            }
            BondOrder::Triple | BondOrder::Quadruple => {
                canvas.split_line(p, q, pair);
                canvas.split_line(offset(p, normal, gap), offset(q, normal, gap), pair);
                canvas.split_line(offset(p, normal, -gap), offset(q, normal, -gap), pair);
            }
            BondOrder::Aromatic => {
                canvas.split_line(p, q, pair);
                let inward = ring_side(rings, idx, &points, p, normal);
                let inset = len * 0.15;
                let p2 = offset(offset(p, normal, gap * inward), dir, inset);
                let q2 = offset(offset(q, normal, gap * inward), dir, -inset);
                canvas.line(p2, q2, [150, 150, 150]);
            }
            BondOrder::Single => canvas.split_line(p, q, pair),
        }
    }

    for (idx, label) in labels.iter().enumerate() {
        if let Some(text) = label {
            canvas.text(points[idx], text, label_scale, colors[idx]);
        }
    }

    canvas
        .pixmap
        .encode_png()
        .map_err(|e| ChemError::Render(e.to_string()))
}

/// +1 when the centroid of the bond's smallest ring lies on the normal's
/// side, -1 otherwise.
fn ring_side(rings: &RingInfo, bond: usize, points: &[[f32; 2]], p: [f32; 2], normal: [f32; 2]) -> f32 {
    let Some(ring) = rings.smallest_ring_of_bond(bond) else {
        return 1.0;
    };
    let n = ring.len() as f32;
    let cx = ring.iter().map(|&a| points[a][0]).sum::<f32>() / n;
    let cy = ring.iter().map(|&a| points[a][1]).sum::<f32>() / n;
    let side = (cx - p[0]) * normal[0] + (cy - p[1]) * normal[1];
    if side >= 0.0 { 1.0 } else { -1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_2d, EmbedOptions};
    use crate::sanitize::sanitize;
    use crate::smiles::parse;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn render(smiles: &str, size: u32) -> Vec<u8> {
        let mut mol = parse(smiles).unwrap();
        let rings = sanitize(&mut mol).unwrap();
        let coords = compute_2d(&mol, &rings, &EmbedOptions::default());
        depict_png(&mol, &rings, &coords, size).unwrap()
    }

    fn labels(smiles: &str) -> Vec<Option<String>> {
        let mut mol = parse(smiles).unwrap();
        sanitize(&mut mol).unwrap();
        (0..mol.atom_count()).map(|i| atom_label(&mol, i)).collect()
    }

    #[test]
    fn test_labels() {
        assert_eq!(labels("CCO"), vec![None, None, Some("OH".into())]);
        assert_eq!(labels("CN"), vec![None, Some("NH2".into())]);
        assert_eq!(labels("C"), vec![Some("CH4".into())]);
        assert_eq!(labels("C[N+](C)(C)C")[1], Some("N+".into()));
        assert_eq!(labels("[O-2]"), vec![Some("O2-".into())]);
        assert_eq!(labels("[13CH4]"), vec![Some("13CH4".into())]);
    }

    #[test]
    fn test_png_output() {
        let png = render("CC(=O)Oc1ccccc1C(=O)O", 300);
        assert_eq!(png[..8], PNG_MAGIC);
        let decoded = Pixmap::decode_png(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 300));
        // something other than background got drawn
        assert!(decoded.pixels().iter().any(|p| p.red() < 128));
    }

    #[test]
    fn test_empty_molecule_is_blank_image() {
        let png = render("", 64);
        let decoded = Pixmap::decode_png(&png).unwrap();
        assert!(decoded.pixels().iter().all(|p| p.red() == 255 && p.green() == 255));
    }
}
