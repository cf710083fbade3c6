//! Separable rectangular morphology on binary masks.
//!
//! Structural-line extraction needs erosion and dilation with extreme strip
//! kernels (for example `1 x width/5`), which square structuring elements
//! cannot express. These operators run a sliding window over row or column
//! prefix sums: erosion keeps a pixel when every in-bounds pixel under the
//! window is set, dilation when any is. Masks are `GrayImage`s with 0 as
//! background and any nonzero value as foreground; outputs use 0/255.

use image::{GrayImage, Luma};

/// Erodes with a `len x 1` horizontal strip kernel.
pub fn erode_horizontal(mask: &GrayImage, len: u32) -> GrayImage {
    horizontal_window(mask, len, true)
}

/// Dilates with a `len x 1` horizontal strip kernel.
pub fn dilate_horizontal(mask: &GrayImage, len: u32) -> GrayImage {
    horizontal_window(mask, len, false)
}

/// Erodes with a `1 x len` vertical strip kernel.
pub fn erode_vertical(mask: &GrayImage, len: u32) -> GrayImage {
    vertical_window(mask, len, true)
}

/// Dilates with a `1 x len` vertical strip kernel.
pub fn dilate_vertical(mask: &GrayImage, len: u32) -> GrayImage {
    vertical_window(mask, len, false)
}

/// Dilates with a `width x height` rectangular kernel (separable: horizontal
/// strip, then vertical strip).
pub fn dilate_rect(mask: &GrayImage, width: u32, height: u32) -> GrayImage {
    dilate_vertical(&dilate_horizontal(mask, width), height)
}

/// Pixel-wise AND of two masks of identical dimensions. Used to turn the
/// horizontal and vertical line masks into the joint mask.
pub fn intersect(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let mut out = GrayImage::new(a.width(), a.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if a.get_pixel(x, y)[0] != 0 && b.get_pixel(x, y)[0] != 0 {
            *pixel = Luma([255]);
        }
    }
    out
}

fn horizontal_window(mask: &GrayImage, len: u32, require_full: bool) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }
    let len = i64::from(len.max(1));
    // Anchor at the kernel centre, matching the usual structuring-element
    // convention for even lengths (one extra pixel to the right).
    let reach_left = len / 2;
    let reach_right = len - 1 - reach_left;
    let mut prefix = vec![0u32; width as usize + 1];
    for y in 0..height {
        for x in 0..width {
            let set = u32::from(mask.get_pixel(x, y)[0] != 0);
            prefix[x as usize + 1] = prefix[x as usize] + set;
        }
        for x in 0..width {
            let lo = (i64::from(x) - reach_left).max(0) as usize;
            let hi = ((i64::from(x) + reach_right).min(i64::from(width) - 1) + 1) as usize;
            let covered = prefix[hi] - prefix[lo];
            let on = if require_full {
                covered as usize == hi - lo
            } else {
                covered > 0
            };
            if on {
                out.put_pixel(x, y, Luma([255]));
            }
        }
    }
    out
}

fn vertical_window(mask: &GrayImage, len: u32, require_full: bool) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }
    let len = i64::from(len.max(1));
    let reach_up = len / 2;
    let reach_down = len - 1 - reach_up;
    let mut prefix = vec![0u32; height as usize + 1];
    for x in 0..width {
        for y in 0..height {
            let set = u32::from(mask.get_pixel(x, y)[0] != 0);
            prefix[y as usize + 1] = prefix[y as usize] + set;
        }
        for y in 0..height {
            let lo = (i64::from(y) - reach_up).max(0) as usize;
            let hi = ((i64::from(y) + reach_down).min(i64::from(height) - 1) + 1) as usize;
            let covered = prefix[hi] - prefix[lo];
            let on = if require_full {
                covered as usize == hi - lo
            } else {
                covered > 0
            };
            if on {
                out.put_pixel(x, y, Luma([255]));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&[u8]]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        GrayImage::from_fn(width, height, |x, y| {
            Luma([rows[y as usize][x as usize] * 255])
        })
    }

    fn row_bits(mask: &GrayImage, y: u32) -> Vec<u8> {
        (0..mask.width())
            .map(|x| u8::from(mask.get_pixel(x, y)[0] != 0))
            .collect()
    }

    #[test]
    fn horizontal_erosion_removes_short_runs() {
        let mask = mask_from_rows(&[&[0, 1, 1, 0, 1, 1, 1, 1, 1, 0]]);
        let eroded = erode_horizontal(&mask, 3);
        assert_eq!(row_bits(&eroded, 0), vec![0, 0, 0, 0, 0, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn horizontal_dilation_grows_runs_both_ways() {
        let mask = mask_from_rows(&[&[0, 0, 0, 0, 1, 0, 0, 0, 0]]);
        let dilated = dilate_horizontal(&mask, 3);
        assert_eq!(row_bits(&dilated, 0), vec![0, 0, 0, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn erosion_then_dilation_preserves_long_run_extent() {
        let mask = mask_from_rows(&[&[0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0]]);
        let restored = dilate_horizontal(&erode_horizontal(&mask, 5), 5);
        assert_eq!(row_bits(&restored, 0), row_bits(&mask, 0));
    }

    #[test]
    fn vertical_window_matches_horizontal_on_transpose() {
        let mask = mask_from_rows(&[&[0], &[1], &[1], &[0], &[1], &[1], &[1], &[0]]);
        let eroded = erode_vertical(&mask, 3);
        let bits: Vec<u8> = (0..mask.height())
            .map(|y| u8::from(eroded.get_pixel(0, y)[0] != 0))
            .collect();
        assert_eq!(bits, vec![0, 0, 0, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn intersect_keeps_only_common_pixels() {
        let a = mask_from_rows(&[&[1, 1, 0]]);
        let b = mask_from_rows(&[&[0, 1, 1]]);
        let joint = intersect(&a, &b);
        assert_eq!(row_bits(&joint, 0), vec![0, 1, 0]);
    }
}
