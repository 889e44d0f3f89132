//! 像素级分析工具：灰度统计、HSV、连通域、直方图峰值

/// 轮廓贴边判定的带宽（像素）
const OUTLINE_BAND: usize = 2;

/// 连通域统计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    pub area: usize,
    pub min_x: usize,
    pub max_x: usize,
    pub min_y: usize,
    pub max_y: usize,
    /// 落在外接矩形边缘带内的像素数
    pub border_area: usize,
}

impl Component {
    fn new(x: usize, y: usize) -> Self {
        Self {
            area: 0,
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
            border_area: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }

    /// 宽高比（宽 / 高）
    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }

    pub fn bbox_area(&self) -> usize {
        self.width() * self.height()
    }

    /// 像素是否构成一个闭合的四边形框：几乎全部贴着外接矩形边缘，且覆盖大部分周长
    pub fn is_rectangle_outline(&self, min_perimeter_coverage: f32) -> bool {
        if self.width() <= OUTLINE_BAND * 2 || self.height() <= OUTLINE_BAND * 2 {
            return false;
        }
        let hugging = self.border_area as f32 / self.area as f32;
        let perimeter = 2 * (self.width() + self.height()) - 4;
        let coverage = self.area as f32 / perimeter as f32;
        hugging >= 0.9 && coverage >= min_perimeter_coverage
    }
}

#[derive(Clone, Copy)]
struct RowRun {
    y: usize,
    start: usize,
    end: usize,
}

struct RunDsu {
    parent: Vec<u32>,
    rank: Vec<u8>,
}

impl RunDsu {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len as u32).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut cur = x;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: u32, b: u32) {
        let mut root_a = self.find(a);
        let mut root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        let rank_a = self.rank[root_a as usize];
        let rank_b = self.rank[root_b as usize];
        if rank_a < rank_b {
            std::mem::swap(&mut root_a, &mut root_b);
        }
        self.parent[root_b as usize] = root_a;
        if rank_a == rank_b {
            self.rank[root_a as usize] = rank_a + 1;
        }
    }
}

/// 8 邻域连通域（基于行程 + 并查集），按首次出现的扫描顺序返回
pub fn connected_components(mask: &[bool], width: usize, height: usize) -> Vec<Component> {
    if width == 0 || height == 0 || mask.len() < width * height {
        return Vec::new();
    }

    let mut runs = Vec::new();
    let mut row_offsets = vec![0usize; height + 1];
    for y in 0..height {
        row_offsets[y] = runs.len();
        let row = &mask[y * width..(y + 1) * width];
        let mut x = 0;
        while x < width {
            if row[x] {
                let start = x;
                while x < width && row[x] {
                    x += 1;
                }
                runs.push(RowRun { y, start, end: x });
            } else {
                x += 1;
            }
        }
    }
    row_offsets[height] = runs.len();
    if runs.is_empty() {
        return Vec::new();
    }

    let mut dsu = RunDsu::new(runs.len());
    for y in 1..height {
        for curr_idx in row_offsets[y]..row_offsets[y + 1] {
            let curr = runs[curr_idx];
            for prev_idx in row_offsets[y - 1]..row_offsets[y] {
                let prev = runs[prev_idx];
                // 对角相邻也算连通
                if prev.end >= curr.start && curr.end >= prev.start {
                    dsu.union(curr_idx as u32, prev_idx as u32);
                }
            }
        }
    }

    let mut slots: Vec<Option<usize>> = vec![None; runs.len()];
    let mut roots = Vec::with_capacity(runs.len());
    let mut components: Vec<Component> = Vec::new();
    for (idx, run) in runs.iter().enumerate() {
        let root = dsu.find(idx as u32) as usize;
        let slot = *slots[root].get_or_insert_with(|| {
            components.push(Component::new(run.start, run.y));
            components.len() - 1
        });
        roots.push(slot);
        let entry = &mut components[slot];
        entry.area += run.end - run.start;
        entry.min_x = entry.min_x.min(run.start);
        entry.max_x = entry.max_x.max(run.end - 1);
        entry.min_y = entry.min_y.min(run.y);
        entry.max_y = entry.max_y.max(run.y);
    }

    // 外接矩形确定后再统计贴边像素
    for (run, &slot) in runs.iter().zip(roots.iter()) {
        let c = &mut components[slot];
        let near_row_edge =
            run.y - c.min_y < OUTLINE_BAND || c.max_y - run.y < OUTLINE_BAND;
        if near_row_edge {
            c.border_area += run.end - run.start;
            continue;
        }
        let left_band_end = (c.min_x + OUTLINE_BAND).min(run.end);
        if left_band_end > run.start {
            c.border_area += left_band_end - run.start;
        }
        let right_band_start = (c.max_x + 1).saturating_sub(OUTLINE_BAND).max(left_band_end.max(run.start));
        if run.end > right_band_start {
            c.border_area += run.end - right_band_start;
        }
    }

    components
}

/// 灰度均值与标准差（总体标准差）
pub fn mean_std(gray: &[u8]) -> (f32, f32) {
    if gray.is_empty() {
        return (0.0, 0.0);
    }
    let n = gray.len() as f64;
    let mean = gray.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = gray
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean as f32, variance.sqrt() as f32)
}

pub fn histogram(gray: &[u8]) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for &v in gray {
        hist[v as usize] += 1;
    }
    hist
}

/// 直方图局部极大值（平台取左端），越界邻居视为 0；按高度降序、亮度升序返回
pub fn histogram_peaks(hist: &[u32; 256], min_count: u32) -> Vec<usize> {
    let mut peaks: Vec<usize> = (0..hist.len())
        .filter(|&i| {
            let value = hist[i];
            let left = if i == 0 { 0 } else { hist[i - 1] };
            let right = if i + 1 == hist.len() { 0 } else { hist[i + 1] };
            value >= min_count.max(1) && value > left && value >= right
        })
        .collect();
    peaks.sort_by(|&a, &b| hist[b].cmp(&hist[a]).then(a.cmp(&b)));
    peaks
}

/// OpenCV 约定：H ∈ [0, 180)，S/V ∈ [0, 255]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta) + 120.0
    } else {
        60.0 * ((r - g) / delta) + 240.0
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    (
        ((h / 2.0).round() as u32 % 180) as u8,
        s.round() as u8,
        v.round() as u8,
    )
}

/// 归一化平均绝对差，尺寸不一致时返回 None
pub fn mean_abs_diff(a: &[u8], b: &[u8]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let sum: u64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as i16 - y as i16).unsigned_abs() as u64)
        .sum();
    Some(sum as f32 / (a.len() as f32 * 255.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&str]) -> (Vec<bool>, usize, usize) {
        let width = rows[0].len();
        let mask = rows
            .iter()
            .flat_map(|row| row.chars().map(|c| c == '#'))
            .collect();
        (mask, width, rows.len())
    }

    #[test]
    fn test_components_are_eight_connected() {
        let (mask, w, h) = mask_from_rows(&["#...", ".#..", "..#.", "...#"]);
        let comps = connected_components(&mask, w, h);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].area, 4);
        assert_eq!((comps[0].min_x, comps[0].max_x), (0, 3));
    }

    #[test]
    fn test_separate_components() {
        let (mask, w, h) = mask_from_rows(&["##..##", "##..##", "......", "..##.."]);
        let comps = connected_components(&mask, w, h);
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[0].area, 4);
        assert_eq!(comps[1].area, 4);
        assert_eq!(comps[2].area, 2);
        assert_eq!(comps[2].min_y, 3);
    }

    #[test]
    fn test_rectangle_outline_detection() {
        let (mask, w, h) = mask_from_rows(&[
            "##########",
            "#........#",
            "#........#",
            "#........#",
            "#........#",
            "##########",
        ]);
        let comps = connected_components(&mask, w, h);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].border_area, comps[0].area);
        assert!(comps[0].is_rectangle_outline(0.75));
    }

    #[test]
    fn test_filled_block_is_not_outline() {
        let rows = vec!["##########"; 8];
        let (mask, w, h) = mask_from_rows(&rows);
        let comps = connected_components(&mask, w, h);
        assert_eq!(comps.len(), 1);
        assert!(!comps[0].is_rectangle_outline(0.75));
    }

    #[test]
    fn test_l_shape_is_not_outline() {
        let (mask, w, h) = mask_from_rows(&[
            "#.........",
            "#.........",
            "#.........",
            "#.........",
            "#.........",
            "##########",
        ]);
        let comps = connected_components(&mask, w, h);
        assert!(!comps[0].is_rectangle_outline(0.75));
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[0, 0, 255, 255]);
        assert!((mean - 127.5).abs() < 1e-3);
        assert!((std - 127.5).abs() < 1e-3);
        assert_eq!(mean_std(&[7; 16]).1, 0.0);
    }

    #[test]
    fn test_histogram_peaks_bimodal() {
        let mut gray = vec![50u8; 600];
        gray.extend(vec![220u8; 400]);
        let hist = histogram(&gray);
        let peaks = histogram_peaks(&hist, 10);
        assert_eq!(peaks, vec![50, 220]);
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0, 255, 255));
        assert_eq!(rgb_to_hsv(0, 255, 0), (60, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 255), (120, 255, 255));
        assert_eq!(rgb_to_hsv(128, 128, 128), (0, 0, 128));
    }

    #[test]
    fn test_mean_abs_diff() {
        assert_eq!(mean_abs_diff(&[0, 0], &[255, 255]), Some(1.0));
        assert_eq!(mean_abs_diff(&[10, 10], &[10, 10]), Some(0.0));
        assert_eq!(mean_abs_diff(&[1], &[1, 2]), None);
    }
}
