//! Built-in transform backend.
//!
//! ## Operation mapping
//!
//! | Spec | Behaviour |
//! |---|---|
//! | `copy` | bytes through |
//! | `template` | asset references rewritten via [`generate::rewrite_references`] |
//! | `stylesheet`, `script` | pass-through, output extension switched to `css` / `js` |
//! | `image` | optional lossless WebP sibling (`image` crate) |
//! | `minify` | pass-through |
//! | `optimize_image` | JPEG re-encode at the configured quality, PNG at best compression |
//!
//! Compilers and minifiers plug in by implementing
//! [`TransformBackend`] and delegating the remaining specs to this one.

use super::backend::{TransformBackend, TransformContext, TransformError, TransformOutput};
use super::spec::{ImageOptions, OptimizeOptions, TemplateOptions, TransformSpec};
use crate::generate;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinBackend;

impl TransformBackend for BuiltinBackend {
    fn apply(
        &self,
        spec: &TransformSpec,
        ctx: &TransformContext<'_>,
        input: TransformOutput,
    ) -> Result<TransformOutput, TransformError> {
        match spec {
            TransformSpec::Copy => Ok(input),
            TransformSpec::Template(opts) => render_template(opts, ctx, input),
            TransformSpec::Stylesheet(_) | TransformSpec::Script(_) | TransformSpec::Minify(_) => {
                debug!(
                    asset = ctx.logical_name,
                    kind = spec.kind(),
                    "no external tool configured, passing through"
                );
                Ok(retag(spec, input))
            }
            TransformSpec::Image(opts) => image_variants(opts, input),
            TransformSpec::OptimizeImage(opts) => optimize_image(opts, ctx, input),
        }
    }
}

fn retag(spec: &TransformSpec, mut output: TransformOutput) -> TransformOutput {
    if let Some(ext) = spec.output_extension() {
        output.extension = ext.to_string();
    }
    output
}

fn render_template(
    opts: &TemplateOptions,
    ctx: &TransformContext<'_>,
    mut input: TransformOutput,
) -> Result<TransformOutput, TransformError> {
    if !opts.rewrite_references {
        return Ok(input);
    }
    let html = std::str::from_utf8(&input.contents).map_err(|e| TransformError::Backend {
        kind: "template",
        message: format!("not valid UTF-8: {e}"),
    })?;
    let rewritten = generate::rewrite_references(html, ctx.manifest, &opts.public_path);
    input.contents = rewritten.into_bytes();
    Ok(input)
}

fn image_variants(
    opts: &ImageOptions,
    mut input: TransformOutput,
) -> Result<TransformOutput, TransformError> {
    if !opts.webp_variant {
        return Ok(input);
    }
    let img = image::load_from_memory(&input.contents)?;
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    let mut buf = Vec::new();
    rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))?;
    input.variants.insert("webp".to_string(), buf);
    Ok(input)
}

fn optimize_image(
    opts: &OptimizeOptions,
    ctx: &TransformContext<'_>,
    mut input: TransformOutput,
) -> Result<TransformOutput, TransformError> {
    let ext = input.extension.to_ascii_lowercase();
    if !matches!(ext.as_str(), "jpg" | "jpeg" | "png") {
        return Ok(input);
    }
    if opts.quality == 0 || opts.quality > 100 {
        return Err(TransformError::Backend {
            kind: "optimize_image",
            message: format!("quality {} outside 1-100", opts.quality),
        });
    }

    let img = image::load_from_memory(&input.contents)?;
    let mut buf = Vec::new();
    if ext == "png" {
        img.write_with_encoder(PngEncoder::new_with_quality(
            &mut buf,
            CompressionType::Best,
            FilterType::Adaptive,
        ))?;
    } else {
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, opts.quality))?;
    }

    // Keep whichever is smaller; re-encoding an already tight file can grow it.
    if buf.len() < input.contents.len() {
        debug!(
            asset = ctx.logical_name,
            before = input.contents.len(),
            after = buf.len(),
            "image optimized"
        );
        input.contents = buf;
    }
    Ok(input)
}
