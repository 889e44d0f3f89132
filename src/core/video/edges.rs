//! Canny 边缘检测（高斯平滑 + Sobel + 非极大值抑制 + 双阈值滞后连接）

const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector {
    low_threshold: f32,
    high_threshold: f32,
}

impl EdgeDetector {
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        Self {
            low_threshold: low_threshold.min(high_threshold),
            high_threshold: high_threshold.max(low_threshold),
        }
    }

    /// 返回逐像素的边缘掩码
    pub fn detect(&self, gray: &[u8], width: usize, height: usize) -> Vec<bool> {
        let len = width * height;
        if width < 3 || height < 3 || gray.len() < len {
            return vec![false; len];
        }

        let blurred = gaussian_blur(gray, width, height);
        let (gx, gy, magnitude) = sobel(&blurred, width, height);
        let thin = non_max_suppression(&gx, &gy, &magnitude, width, height);
        self.hysteresis(&thin, width, height)
    }

    fn hysteresis(&self, magnitude: &[f32], width: usize, height: usize) -> Vec<bool> {
        let mut edges = vec![false; width * height];
        let mut stack: Vec<usize> = magnitude
            .iter()
            .enumerate()
            .filter(|(_, &m)| m > self.high_threshold)
            .map(|(i, _)| i)
            .collect();
        for &i in &stack {
            edges[i] = true;
        }

        while let Some(idx) = stack.pop() {
            let x = idx % width;
            let y = idx / width;
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    let n = ny * width + nx;
                    if !edges[n] && magnitude[n] > self.low_threshold {
                        edges[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        edges
    }
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new(50.0, 150.0)
    }
}

/// 边缘像素占比
pub fn mask_density(edges: &[bool]) -> f32 {
    if edges.is_empty() {
        return 0.0;
    }
    edges.iter().filter(|&&e| e).count() as f32 / edges.len() as f32
}

/// 5x5 可分离高斯核 [1 4 6 4 1] / 16，边界复制
fn gaussian_blur(gray: &[u8], width: usize, height: usize) -> Vec<f32> {
    const KERNEL: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];
    let clamp = |v: isize, max: usize| v.clamp(0, max as isize - 1) as usize;

    let mut horizontal = vec![0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, weight) in KERNEL.iter().enumerate() {
                let sx = clamp(x as isize + k as isize - 2, width);
                acc += gray[y * width + sx] as f32 * weight;
            }
            horizontal[y * width + x] = acc / 16.0;
        }
    }

    let mut out = vec![0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, weight) in KERNEL.iter().enumerate() {
                let sy = clamp(y as isize + k as isize - 2, height);
                acc += horizontal[sy * width + x] * weight;
            }
            out[y * width + x] = acc / 16.0;
        }
    }
    out
}

/// Sobel 梯度，幅值取 L1 范数；图像边界一圈置零
fn sobel(img: &[f32], width: usize, height: usize) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let len = width * height;
    let mut gx = vec![0f32; len];
    let mut gy = vec![0f32; len];
    let mut magnitude = vec![0f32; len];

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let p = |dx: isize, dy: isize| {
                img[(y as isize + dy) as usize * width + (x as isize + dx) as usize]
            };
            let dx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            let dy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
            let idx = y * width + x;
            gx[idx] = dx;
            gy[idx] = dy;
            magnitude[idx] = dx.abs() + dy.abs();
        }
    }

    (gx, gy, magnitude)
}

fn non_max_suppression(
    gx: &[f32],
    gy: &[f32],
    magnitude: &[f32],
    width: usize,
    height: usize,
) -> Vec<f32> {
    let mut out = vec![0f32; width * height];

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            let m = magnitude[idx];
            if m == 0.0 {
                continue;
            }
            let ax = gx[idx].abs();
            let ay = gy[idx].abs();

            let (a, b) = if ay <= ax * TAN_22_5 {
                (idx - 1, idx + 1)
            } else if ay > ax * TAN_67_5 {
                (idx - width, idx + width)
            } else if (gx[idx] > 0.0) == (gy[idx] > 0.0) {
                (idx - width - 1, idx + width + 1)
            } else {
                (idx - width + 1, idx + width - 1)
            };

            if m > magnitude[a] && m >= magnitude[b] {
                out[idx] = m;
            }
        }
    }

    out
}
