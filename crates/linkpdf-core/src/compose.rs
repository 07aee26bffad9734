//! Single-page PDF composition
//!
//! Builds the document object by object with lopdf: the rasterized frame as a
//! full-page image XObject and one `/Link` annotation carrying a `/URI` action.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::coords::{PageSize, TargetRegion};
use crate::error::ComposeError;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Resource name of the background image on the page
const BACKGROUND_NAME: &str = "Bg";

/// Decoded PNG split into colour samples and an optional alpha plane
struct RasterImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    color: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

fn decode_png(bytes: &[u8]) -> Result<RasterImage, ComposeError> {
    let mut decoder = png::Decoder::new(bytes);
    // Palette and sub-byte depths expand, 16-bit strips to 8
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder
        .read_info()
        .map_err(|e| ComposeError::ImageDecode(e.to_string()))?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| ComposeError::ImageDecode(e.to_string()))?;
    buf.truncate(info.buffer_size());

    if info.bit_depth != png::BitDepth::Eight {
        return Err(ComposeError::UnsupportedImage(format!(
            "bit depth {:?} after normalization",
            info.bit_depth
        )));
    }

    let (color_space, channels, has_alpha) = match info.color_type {
        png::ColorType::Grayscale => ("DeviceGray", 1, false),
        png::ColorType::GrayscaleAlpha => ("DeviceGray", 1, true),
        png::ColorType::Rgb => ("DeviceRGB", 3, false),
        png::ColorType::Rgba => ("DeviceRGB", 3, true),
        png::ColorType::Indexed => {
            return Err(ComposeError::UnsupportedImage(
                "palette image was not expanded".into(),
            ))
        }
    };

    let pixel_count = info.width as usize * info.height as usize;
    let (color, alpha) = if has_alpha {
        let stride = channels + 1;
        let mut color = Vec::with_capacity(pixel_count * channels);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in buf.chunks_exact(stride) {
            color.extend_from_slice(&pixel[..channels]);
            alpha.push(pixel[channels]);
        }
        // A fully opaque mask adds bytes and nothing else
        let alpha = if alpha.iter().all(|&a| a == u8::MAX) {
            None
        } else {
            Some(alpha)
        };
        (color, alpha)
    } else {
        (buf, None)
    };

    Ok(RasterImage {
        width: info.width,
        height: info.height,
        color_space,
        color,
        alpha,
    })
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ComposeError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| ComposeError::Serialize(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ComposeError::Serialize(e.to_string()))
}

fn image_stream(
    width: u32,
    height: u32,
    color_space: &str,
    samples: &[u8],
    smask: Option<ObjectId>,
) -> Result<Stream, ComposeError> {
    let mut dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(color_space.as_bytes().to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ]);
    if let Some(mask_id) = smask {
        dict.set("SMask", Object::Reference(mask_id));
    }
    Ok(Stream::new(dict, deflate(samples)?))
}

fn add_image(doc: &mut Document, image: &RasterImage) -> Result<ObjectId, ComposeError> {
    let smask = match &image.alpha {
        Some(alpha) => Some(doc.add_object(image_stream(
            image.width,
            image.height,
            "DeviceGray",
            alpha,
            None,
        )?)),
        None => None,
    };

    let stream = image_stream(
        image.width,
        image.height,
        image.color_space,
        &image.color,
        smask,
    )?;
    Ok(doc.add_object(stream))
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn link_annotation(region: &TargetRegion, url: &str) -> Dictionary {
    let action = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Action".to_vec())),
        ("S", Object::Name(b"URI".to_vec())),
        (
            "URI",
            Object::String(url.as_bytes().to_vec(), StringFormat::Literal),
        ),
    ]);

    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Annot".to_vec())),
        ("Subtype", Object::Name(b"Link".to_vec())),
        (
            "Rect",
            Object::Array(region.as_array().iter().map(|&v| real(v)).collect()),
        ),
        // No visible border around the clickable area
        (
            "Border",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(0),
            ]),
        ),
        ("A", Object::Dictionary(action)),
    ])
}

/// Build a one-page PDF: `background_png` stretched over the whole page and a
/// link annotation covering `region` that opens `url`.
pub fn compose_document(
    page: &PageSize,
    background_png: &[u8],
    region: &TargetRegion,
    url: &str,
) -> Result<Vec<u8>, ComposeError> {
    let image = decode_png(background_png)?;
    debug!(
        "Background {}x{} px ({}, alpha: {}) on {}x{} pt page",
        image.width,
        image.height,
        image.color_space,
        image.alpha.is_some(),
        page.width,
        page.height
    );

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let image_id = add_image(&mut doc, &image)?;

    // Unit square scaled to the page, image drawn into it
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(page.width),
                    Object::Integer(0),
                    Object::Integer(0),
                    real(page.height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(BACKGROUND_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|e| ComposeError::Serialize(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content_bytes));

    let annot_id = doc.add_object(Object::Dictionary(link_annotation(region, url)));

    let mut xobjects = Dictionary::new();
    xobjects.set(BACKGROUND_NAME, Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let page_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                real(page.width),
                real(page.height),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
        ("Annots", Object::Array(vec![Object::Reference(annot_id)])),
    ]);
    let page_id = doc.add_object(page_dict);

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(1)),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ComposeError::Serialize(e.to_string()))?;

    Ok(buffer)
}
