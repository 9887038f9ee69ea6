//! Debug tool for inspecting the safe corridor
//! Writes the height field, the trap attenuation mask and the ravine mask as
//! PNGs, with the A* path from the highest cell drawn over the height field

use image::{GrayImage, Luma, Rgb, RgbImage};
use terraform_descent::config::{GenerationConfig, PathfindingConfig};
use terraform_descent::generation::MapGenerator;
use terraform_descent::heightfield::quantize;
use terraform_descent::pathfinding::find_path;
use terraform_descent::tilemap::Tilemap;
use terraform_descent::logging;

const WIDTH: usize = 256;
const HEIGHT: usize = 256;
const SEED: u64 = 42;

fn main() {
    logging::init();
    println!("Generating corridor debug images...");

    let generator = MapGenerator::new(GenerationConfig::default());
    let (field, mask) = generator.generate(WIDTH, HEIGHT, Some(SEED));

    let start = field.altitude().argmax();
    let path = find_path(&field, start, field.shelter_coords(), &PathfindingConfig::default());
    println!(
        "Path from {:?} to {:?}: {} cells, cost {:.2}",
        start,
        field.shelter_coords(),
        path.node_count(),
        path.total_cost
    );

    let mut terrain: RgbImage = RgbImage::from_fn(WIDTH as u32, HEIGHT as u32, |x, y| {
        let v = quantize(*field.altitude().get(x as usize, y as usize));
        Rgb([v, v, v])
    });
    for &(x, y) in &path.nodes {
        terrain.put_pixel(x as u32, y as u32, Rgb([255, 40, 40]));
    }
    let (sx, sy) = field.shelter_coords();
    terrain.put_pixel(sx as u32, sy as u32, Rgb([40, 255, 40]));
    terrain.save("corridor_terrain.png").expect("Failed to save terrain image");

    mask_image(&mask.trap_attenuation)
        .save("corridor_attenuation.png")
        .expect("Failed to save attenuation mask");
    match &mask.ravine_carve {
        Some(carve) => mask_image(carve)
            .save("corridor_ravine.png")
            .expect("Failed to save ravine mask"),
        None => println!("Ravine disabled; no ravine mask written"),
    }

    println!("Saved corridor_terrain.png, corridor_attenuation.png, corridor_ravine.png");
}

/// Unit-range mask to grayscale (white = 1).
fn mask_image(mask: &Tilemap<f32>) -> GrayImage {
    GrayImage::from_fn(mask.width as u32, mask.height as u32, |x, y| {
        Luma([(mask.get(x as usize, y as usize).clamp(0.0, 1.0) * 255.0).round() as u8])
    })
}
