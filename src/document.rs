//! Document Wrapper Module
//! Wraps a rendered JPEG into single-page PDF or EPS documents.
//!
//! Both formats embed the image as a DCT (JPEG) stream, so no re-encoding
//! is needed: PDF references it as an image XObject, EPS feeds it through
//! the ASCIIHex and DCT decode filters of a Level 2 `image` operator.

use std::fmt::Write as _;

/// Pixels are mapped to points at 96 dpi
const POINTS_PER_PIXEL: f64 = 72.0 / 96.0;
/// Hex characters per EPS data line
const HEX_LINE_WIDTH: usize = 64;

fn page_size(width: u32, height: u32) -> (f64, f64) {
    (width as f64 * POINTS_PER_PIXEL, height as f64 * POINTS_PER_PIXEL)
}

/// Build a one-page PDF showing `jpeg` at the page's full size.
pub fn pdf_from_jpeg(jpeg: &[u8], width: u32, height: u32) -> Vec<u8> {
    let (page_w, page_h) = page_size(width, height);
    let content = format!("q {:.2} 0 0 {:.2} 0 0 cm /Im0 Do Q\n", page_w, page_h);

    let mut out: Vec<u8> = Vec::with_capacity(jpeg.len() + 1024);
    let mut offsets: Vec<usize> = Vec::with_capacity(5);

    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    // 1. Catalog
    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    // 2. Page tree
    offsets.push(out.len());
    out.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

    // 3. Page
    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Resources << /XObject << /Im0 4 0 R >> >> /Contents 5 0 R >>\nendobj\n",
            page_w, page_h
        )
        .as_bytes(),
    );

    // 4. Image
    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "4 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} \
             /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
            width,
            height,
            jpeg.len()
        )
        .as_bytes(),
    );
    out.extend_from_slice(jpeg);
    out.extend_from_slice(b"\nendstream\nendobj\n");

    // 5. Page content
    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "5 0 obj\n<< /Length {} >>\nstream\n{}endstream\nendobj\n",
            content.len(),
            content
        )
        .as_bytes(),
    );

    // Cross-reference table; every entry is exactly 20 bytes
    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
    for offset in &offsets {
        let _ = write!(xref, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        offsets.len() + 1,
        xref_offset
    );
    out.extend_from_slice(xref.as_bytes());

    out
}

/// Build an Encapsulated PostScript file drawing `jpeg` over its bounding box.
pub fn eps_from_jpeg(jpeg: &[u8], width: u32, height: u32) -> Vec<u8> {
    let (page_w, page_h) = page_size(width, height);

    let mut out = String::with_capacity(jpeg.len() * 2 + jpeg.len() / 32 + 1024);
    let _ = write!(
        out,
        "%!PS-Adobe-3.0 EPSF-3.0\n\
         %%BoundingBox: 0 0 {} {}\n\
         %%HiResBoundingBox: 0 0 {:.2} {:.2}\n\
         %%Creator: write-charts\n\
         %%LanguageLevel: 2\n\
         %%Pages: 1\n\
         %%EndComments\n\
         gsave\n\
         {:.2} {:.2} scale\n\
         /DeviceRGB setcolorspace\n\
         << /ImageType 1 /Width {} /Height {} /BitsPerComponent 8\n   \
         /Decode [0 1 0 1 0 1] /ImageMatrix [{} 0 0 -{} 0 {}]\n   \
         /DataSource currentfile /ASCIIHexDecode filter /DCTDecode filter >> image\n",
        page_w.ceil() as u32,
        page_h.ceil() as u32,
        page_w,
        page_h,
        page_w,
        page_h,
        width,
        height,
        width,
        height,
        height
    );

    for chunk in jpeg.chunks(HEX_LINE_WIDTH / 2) {
        for byte in chunk {
            let _ = write!(out, "{:02x}", byte);
        }
        out.push('\n');
    }
    out.push_str(">\ngrestore\nshowpage\n%%EOF\n");

    out.into_bytes()
}
