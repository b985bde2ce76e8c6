// Raster primitives shared by detection, inpainting and OCR preprocessing
//
// Pure Rust equivalents of the handful of OpenCV operations the pipeline
// needs: binary thresholding, morphological dilation with rectangular and
// elliptical structuring elements, adaptive mean thresholding, and a
// polygon area for contour filtering.

use image::{GrayImage, Luma, RgbaImage};
use imageproc::point::Point;

/// Binary threshold: pixels strictly above `thresh` become 255, others 0
pub fn threshold_binary(img: &GrayImage, thresh: u8) -> GrayImage {
    let mut out = GrayImage::new(img.width(), img.height());
    for (dst, src) in out.pixels_mut().zip(img.pixels()) {
        *dst = Luma([if src[0] > thresh { 255 } else { 0 }]);
    }
    out
}

/// Inverse binary threshold: pixels at or below `thresh` become 255
pub fn threshold_binary_inv(img: &GrayImage, thresh: u8) -> GrayImage {
    let mut out = GrayImage::new(img.width(), img.height());
    for (dst, src) in out.pixels_mut().zip(img.pixels()) {
        *dst = Luma([if src[0] > thresh { 0 } else { 255 }]);
    }
    out
}

/// Dilate with an explicit structuring element, repeated `iterations` times
///
/// The element is given as offsets from the anchor. imageproc's norm-ball
/// dilation cannot express an elliptical 5x5 element, so the element is
/// applied directly.
fn dilate_with_element(img: &GrayImage, element: &[(i32, i32)], iterations: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut current = img.clone();

    for _ in 0..iterations {
        let mut next = GrayImage::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let mut max_val = 0u8;
                for &(dx, dy) in element {
                    let sx = x + dx;
                    let sy = y + dy;
                    if sx >= 0 && sy >= 0 && sx < width as i32 && sy < height as i32 {
                        max_val = max_val.max(current.get_pixel(sx as u32, sy as u32)[0]);
                    }
                    if max_val == 255 {
                        break;
                    }
                }
                next.put_pixel(x as u32, y as u32, Luma([max_val]));
            }
        }
        current = next;
    }

    current
}

/// Elliptical structuring element of the given (odd) diameter
fn ellipse_element(diameter: i32) -> Vec<(i32, i32)> {
    let r = diameter / 2;
    let rf = r as f32 + 0.5;
    let mut element = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx * dx + dy * dy) as f32 <= rf * rf {
                element.push((dx, dy));
            }
        }
    }
    element
}

/// Dilation with an elliptical kernel (detector: merge bright fragments)
pub fn dilate_ellipse(img: &GrayImage, diameter: i32, iterations: u32) -> GrayImage {
    dilate_with_element(img, &ellipse_element(diameter), iterations)
}

/// Dilation with a full square kernel (inpaint mask: cover stroke edges)
pub fn dilate_rect(img: &GrayImage, size: i32, iterations: u32) -> GrayImage {
    let r = size / 2;
    let mut element = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            element.push((dx, dy));
        }
    }
    dilate_with_element(img, &element, iterations)
}

/// Adaptive mean threshold: binarize each pixel against the mean of its
/// (2r+1)^2 neighborhood minus `offset` (OCR preprocessing for region crops)
pub fn adaptive_mean_threshold(img: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (width, height) = img.dimensions();
    let r = (block_size / 2) as i64;

    // Summed-area table with a zero first row/column
    let w = width as usize + 1;
    let h = height as usize + 1;
    let mut integral = vec![0u64; w * h];
    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += u64::from(img.get_pixel(x as u32, y as u32)[0]);
            integral[(y + 1) * w + (x + 1)] = integral[y * w + (x + 1)] + row_sum;
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let x1 = (x - r).max(0) as usize;
            let y1 = (y - r).max(0) as usize;
            let x2 = ((x + r).min(width as i64 - 1) + 1) as usize;
            let y2 = ((y + r).min(height as i64 - 1) + 1) as usize;
            let count = ((x2 - x1) * (y2 - y1)) as u64;
            let sum = integral[y2 * w + x2] + integral[y1 * w + x1]
                - integral[y1 * w + x2]
                - integral[y2 * w + x1];
            let mean = (sum / count) as i32;
            let v = i32::from(img.get_pixel(x as u32, y as u32)[0]);
            out.put_pixel(
                x as u32,
                y as u32,
                Luma([if v > mean - offset { 255 } else { 0 }]),
            );
        }
    }
    out
}

/// Shoelace area of a contour's point sequence
pub fn contour_area(points: &[Point<u32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0i64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        acc += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    (acc.abs() as f64) / 2.0
}

/// Axis-aligned bounding box of a contour: (x, y, width, height)
pub fn bounding_rect(points: &[Point<u32>]) -> (u32, u32, u32, u32) {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
}

/// Crop a rectangle out of a page raster
pub fn crop_rgba(img: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
    image::imageops::crop_imm(img, x, y, width, height).to_image()
}

/// Write a patch back into the page raster at the given origin
pub fn paste_rgba(img: &mut RgbaImage, patch: &RgbaImage, x: u32, y: u32) {
    image::imageops::replace(img, patch, i64::from(x), i64::from(y));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_pair_is_complementary() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, Luma([250]));
        img.put_pixel(1, 0, Luma([40]));

        let th = threshold_binary(&img, 210);
        assert_eq!(th.get_pixel(0, 0)[0], 255);
        assert_eq!(th.get_pixel(1, 0)[0], 0);

        let inv = threshold_binary_inv(&img, 210);
        assert_eq!(inv.get_pixel(0, 0)[0], 0);
        assert_eq!(inv.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn ellipse_dilation_grows_a_point() {
        let mut img = GrayImage::new(11, 11);
        img.put_pixel(5, 5, Luma([255]));
        let dil = dilate_ellipse(&img, 5, 1);
        assert_eq!(dil.get_pixel(5, 3)[0], 255);
        assert_eq!(dil.get_pixel(3, 5)[0], 255);
        // Square corners stay outside the elliptical element
        assert_eq!(dil.get_pixel(3, 3)[0], 0);
    }

    #[test]
    fn contour_area_of_square() {
        let pts = vec![
            Point::new(0u32, 0u32),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(contour_area(&pts), 100.0);
    }

    #[test]
    fn adaptive_threshold_keeps_flat_regions_bright() {
        let img = GrayImage::from_pixel(20, 20, Luma([128]));
        let th = adaptive_mean_threshold(&img, 11, 2);
        // Flat image: every pixel equals the local mean, offset keeps it white
        assert!(th.pixels().all(|p| p[0] == 255));
    }
}
