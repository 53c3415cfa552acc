//! Procedural textures. The scene ships no image assets; every texture is a
//! small RGBA8 buffer generated at startup and uploaded once.

use std::collections::HashMap;

use super::TextureId;

/// CPU-side RGBA8 image.
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Image {
    fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }
}

pub fn white() -> Image {
    Image::from_fn(1, 1, |_, _| [255, 255, 255, 255])
}

/// Asphalt with a dashed center line and solid edge lines. V runs along the
/// road.
pub fn road(width: u32, height: u32) -> Image {
    Image::from_fn(width, height, |x, y| {
        let fx = x as f32 / width as f32;
        let center = (fx - 0.5).abs() < 0.02;
        let dash_on = (y / (height / 8)) % 2 == 0;
        let edge = fx < 0.04 || fx > 0.96;
        if (center && dash_on) || edge {
            [220, 220, 210, 255]
        } else {
            // Speckled asphalt.
            let speck = ((x * 7 + y * 13) % 17) as u8;
            let g = 95 + speck;
            [g, g, g, 255]
        }
    })
}

/// One heartbeat period of an ECG trace, white on transparent; the strip
/// repeats horizontally and is tinted by the draw material.
pub fn ecg(width: u32, height: u32) -> Image {
    let trace_y = |x: u32| -> f32 {
        let t = x as f32 / width as f32;
        // Flat baseline with a QRS-like spike around t = 0.5.
        let spike = if (0.44..0.48).contains(&t) {
            -(t - 0.44) / 0.04 * 0.15
        } else if (0.48..0.52).contains(&t) {
            -0.15 + (t - 0.48) / 0.04 * 0.95
        } else if (0.52..0.58).contains(&t) {
            0.8 - (t - 0.52) / 0.06 * 1.05
        } else if (0.58..0.62).contains(&t) {
            -0.25 + (t - 0.58) / 0.04 * 0.25
        } else {
            0.0
        };
        0.5 - spike * 0.45
    };
    Image::from_fn(width, height, |x, y| {
        let fy = y as f32 / height as f32;
        if (fy - trace_y(x)).abs() < 0.06 {
            [255, 255, 255, 255]
        } else {
            [0, 0, 0, 0]
        }
    })
}

/// Battery glyph: outline plus terminal nub, transparent interior.
pub fn battery(width: u32, height: u32) -> Image {
    Image::from_fn(width, height, |x, y| {
        let fx = x as f32 / width as f32;
        let fy = y as f32 / height as f32;
        let body = fx < 0.9;
        let border = 0.06;
        let outline = body
            && (fx < border || fx > 0.9 - border || fy < border * 2.0 || fy > 1.0 - border * 2.0);
        let nub = fx >= 0.9 && (0.3..0.7).contains(&fy);
        if outline || nub {
            [235, 235, 235, 255]
        } else {
            [0, 0, 0, 0]
        }
    })
}

/// Right-pointing arrow; the left arrow is this quad with X mirrored.
pub fn arrow(size: u32) -> Image {
    Image::from_fn(size, size, |x, y| {
        let fx = x as f32 / size as f32;
        let fy = (y as f32 / size as f32 - 0.5).abs();
        // Triangle: full height at the left edge narrowing to a point.
        if fx < 0.85 && fy < (0.85 - fx) * 0.5 {
            [240, 240, 240, 255]
        } else {
            [0, 0, 0, 0]
        }
    })
}

/// Warning triangle with an exclamation bar.
pub fn warning(size: u32) -> Image {
    Image::from_fn(size, size, |x, y| {
        let fx = x as f32 / size as f32 - 0.5;
        let fy = 1.0 - y as f32 / size as f32;
        let inside = fy > 0.1 && fy < 0.9 && fx.abs() < (0.9 - fy) * 0.55;
        if !inside {
            return [0, 0, 0, 0];
        }
        let bang = fx.abs() < 0.05 && ((0.3..0.7).contains(&fy) || fy < 0.22);
        if bang {
            [30, 30, 30, 255]
        } else {
            [250, 200, 30, 255]
        }
    })
}

/// Warm radial gradient for the sun sphere.
pub fn sun(size: u32) -> Image {
    Image::from_fn(size, size, |x, y| {
        let fx = x as f32 / size as f32 - 0.5;
        let fy = y as f32 / size as f32 - 0.5;
        let d = (fx * fx + fy * fy).sqrt() * 2.0;
        let t = (1.0 - d).clamp(0.0, 1.0);
        let r = 255.0;
        let g = 200.0 + t * 55.0;
        let b = 120.0 + t * 135.0;
        [r as u8, g as u8, b as u8, 255]
    })
}

/// Texture with its sampler bind group, ready for group(2).
pub struct GpuTexture {
    pub bind_group: wgpu::BindGroup,
}

/// All scene textures plus a white fallback. A missing texture downgrades a
/// draw to untextured instead of failing it.
pub struct TextureLibrary {
    textures: HashMap<TextureId, GpuTexture>,
    fallback: GpuTexture,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl TextureLibrary {
    pub fn build(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("scene_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let upload = |label: &str, image: &Image| -> GpuTexture {
            let size = wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            };
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &image.pixels,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(image.width * 4),
                    rows_per_image: Some(image.height),
                },
                size,
            );
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            });
            GpuTexture { bind_group }
        };

        let mut textures = HashMap::new();
        textures.insert(TextureId::Road, upload("road", &road(128, 256)));
        textures.insert(TextureId::Ecg, upload("ecg", &ecg(256, 64)));
        textures.insert(TextureId::Battery, upload("battery", &battery(64, 40)));
        textures.insert(TextureId::Arrow, upload("arrow", &arrow(32)));
        textures.insert(TextureId::Warning, upload("warning", &warning(64)));
        textures.insert(TextureId::Sun, upload("sun", &sun(64)));
        let fallback = upload("white", &white());

        Self {
            textures,
            fallback,
            bind_group_layout,
        }
    }

    /// Resolves a draw command's texture request: `(bind group, sample it?)`.
    /// Requests for absent textures degrade to the untextured fallback.
    pub fn resolve(&self, id: Option<TextureId>) -> (&wgpu::BindGroup, bool) {
        match id {
            Some(id) => match self.textures.get(&id) {
                Some(tex) => (&tex.bind_group, true),
                None => (&self.fallback.bind_group, false),
            },
            None => (&self.fallback.bind_group, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(img: &Image, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * img.width + x) * 4) as usize;
        [
            img.pixels[i],
            img.pixels[i + 1],
            img.pixels[i + 2],
            img.pixels[i + 3],
        ]
    }

    #[test]
    fn test_image_sizes() {
        let img = road(128, 256);
        assert_eq!(img.pixels.len(), 128 * 256 * 4);
        assert_eq!(white().pixels, vec![255; 4]);
    }

    #[test]
    fn test_arrow_points_right() {
        let img = arrow(32);
        // Opaque near the left-center, transparent at the right edge corners.
        assert_eq!(pixel(&img, 2, 16)[3], 255);
        assert_eq!(pixel(&img, 31, 0)[3], 0);
        assert_eq!(pixel(&img, 31, 31)[3], 0);
    }

    #[test]
    fn test_ecg_has_trace_and_transparent_background() {
        let img = ecg(256, 64);
        let opaque = img.pixels.chunks(4).filter(|p| p[3] == 255).count();
        let transparent = img.pixels.chunks(4).filter(|p| p[3] == 0).count();
        assert!(opaque > 100, "trace must exist");
        assert!(transparent > opaque, "background dominates");
        // Baseline is present at the left edge.
        assert_eq!(pixel(&img, 0, 32)[3], 255);
    }

    #[test]
    fn test_battery_outline_hollow() {
        let img = battery(64, 40);
        assert_eq!(pixel(&img, 1, 20)[3], 255, "left outline");
        assert_eq!(pixel(&img, 30, 20)[3], 0, "hollow interior");
        assert_eq!(pixel(&img, 62, 20)[3], 255, "terminal nub");
    }
}
