// Per-episode training curves drawn on the software canvas.

use crate::core::RenderFrame;
use crate::utils::render2d::{Canvas, Color, BLUE, GRAY, RED, WHITE};

const MARGIN: i32 = 12;

/// Two stacked line plots: episode return on top, steps per episode below.
/// Each panel is scaled to its own min/max; episodes run left to right.
pub fn training_chart(returns: &[f64], steps: &[usize], width: u32, height: u32) -> RenderFrame {
    let mut canvas = Canvas::new(width.max(64), height.max(64));
    canvas.clear(WHITE);

    let w = canvas.width as i32;
    let panel_h = canvas.height as i32 / 2;
    let steps: Vec<f64> = steps.iter().map(|&s| s as f64).collect();
    draw_panel(&mut canvas, returns, 0, w, panel_h, BLUE);
    draw_panel(&mut canvas, &steps, panel_h, w, panel_h, RED);

    canvas.into_render_frame()
}

fn draw_panel(canvas: &mut Canvas, values: &[f64], top: i32, width: i32, height: i32, color: Color) {
    let (x0, y0) = (MARGIN, top + MARGIN);
    let (pw, ph) = (width - 2 * MARGIN, height - 2 * MARGIN);
    canvas.stroke_rect(x0, y0, pw, ph, GRAY);
    if values.is_empty() { return; }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };
    let last = (values.len() - 1).max(1) as f64;

    let points: Vec<(i32, i32)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let x = x0 + ((i as f64 / last) * (pw - 1) as f64).round() as i32;
            let y = y0 + ph - 1 - (((v - lo) / span) * (ph - 1) as f64).round() as i32;
            (x, y)
        })
        .collect();
    canvas.draw_polyline(&points, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_color(frame: &RenderFrame, c: Color) -> bool {
        match frame {
            RenderFrame::Pixels { data, .. } => data.chunks(4).any(|p| p == [c.0, c.1, c.2, c.3]),
            RenderFrame::Text(_) => false,
        }
    }

    #[test]
    fn chart_has_both_curves() {
        let frame = training_chart(&[-30.0, 50.0, 98.0], &[40, 12, 3], 320, 240);
        match &frame {
            RenderFrame::Pixels { width, height, data } => {
                assert_eq!((*width, *height), (320, 240));
                assert_eq!(data.len(), 320 * 240 * 4);
            }
            RenderFrame::Text(_) => panic!("expected pixels"),
        }
        assert!(has_color(&frame, BLUE));
        assert!(has_color(&frame, RED));
    }

    #[test]
    fn empty_and_flat_series_do_not_panic() {
        let frame = training_chart(&[], &[], 10, 10);
        assert!(!has_color(&frame, BLUE));
        let frame = training_chart(&[5.0], &[1], 100, 100);
        assert!(has_color(&frame, BLUE));
    }
}
