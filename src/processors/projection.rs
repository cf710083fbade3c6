//! Column ink projections and gap grouping for seam detection.

use image::GrayImage;

/// Counts foreground pixels per column, restricted to rows `top..bottom`.
/// The band bounds are clamped to the image height.
pub fn column_ink_counts(mask: &GrayImage, top: u32, bottom: u32) -> Vec<u32> {
    let (width, height) = mask.dimensions();
    let top = top.min(height);
    let bottom = bottom.min(height);
    let mut counts = vec![0u32; width as usize];
    for y in top..bottom {
        for x in 0..width {
            if mask.get_pixel(x, y)[0] != 0 {
                counts[x as usize] += 1;
            }
        }
    }
    counts
}

/// Groups contiguous columns whose ink count is at most `max_ink` into
/// `(start, len)` runs.
pub fn gap_groups(counts: &[u32], max_ink: f32) -> Vec<(usize, usize)> {
    let mut groups = Vec::new();
    let mut run_start: Option<usize> = None;
    for (index, &count) in counts.iter().enumerate() {
        if count as f32 <= max_ink {
            run_start.get_or_insert(index);
        } else if let Some(start) = run_start.take() {
            groups.push((start, index - start));
        }
    }
    if let Some(start) = run_start {
        groups.push((start, counts.len() - start));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn counts_are_restricted_to_band() {
        let mut mask = GrayImage::new(4, 10);
        for y in 0..10 {
            mask.put_pixel(1, y, Luma([255]));
        }
        mask.put_pixel(2, 0, Luma([255]));
        let counts = column_ink_counts(&mask, 2, 8);
        assert_eq!(counts, vec![0, 6, 0, 0]);
    }

    #[test]
    fn gap_groups_finds_contiguous_runs() {
        let counts = vec![9, 0, 0, 0, 7, 7, 1, 1, 9];
        assert_eq!(gap_groups(&counts, 1.0), vec![(1, 3), (6, 2)]);
    }

    #[test]
    fn trailing_gap_is_closed() {
        let counts = vec![9, 9, 0, 0];
        assert_eq!(gap_groups(&counts, 0.0), vec![(2, 2)]);
    }

    #[test]
    fn no_gaps_when_every_column_has_ink() {
        let counts = vec![5, 6, 7];
        assert!(gap_groups(&counts, 1.0).is_empty());
    }
}
