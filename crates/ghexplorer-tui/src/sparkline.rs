// Inline sparklines for the stats header
use ghexplorer_core::Bucket;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One block character per value, scaled to the largest
pub fn render_sparkline(data: &[u64]) -> String {
    let max = data.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return BARS[0].to_string().repeat(data.len());
    }

    data.iter()
        .map(|&v| BARS[((v * 7) / max) as usize])
        .collect()
}

pub fn bucket_sparkline(buckets: &[Bucket]) -> String {
    let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
    render_sparkline(&counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_rendering() {
        let sparkline = render_sparkline(&[1, 2, 3, 5, 8, 5, 3, 2]);
        assert_eq!(sparkline.chars().count(), 8);
        assert_eq!(sparkline.chars().nth(4), Some('█'));
    }

    #[test]
    fn test_empty_sparkline() {
        assert_eq!(render_sparkline(&[]), "");
    }

    #[test]
    fn test_zero_data_sparkline() {
        assert_eq!(render_sparkline(&[0, 0, 0]), "▁▁▁");
    }
}
