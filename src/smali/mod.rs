//! Smali method regions.
//!
//! A method region spans from a `.method` marker to the next `.end method` marker. Regions are
//! built by pairing the n-th begin marker with the n-th end marker in document order. Nested or
//! unbalanced markers are not validated: excess markers of either kind are dropped and a
//! mispaired region may cover the wrong text.

mod callable;

pub use self::callable::{CallableId, CallableNamer};

use serde::Deserialize;

/// Marker opening a method.
pub const METHOD_BEGIN: &str = ".method";
/// Marker closing a method.
pub const METHOD_END: &str = ".end method";

/// How a match is resolved to the method containing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The region containing the match position.
    Offset,
    /// The first region, in document order, whose text contains the matched string.
    FirstContaining,
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::Offset
    }
}

/// Half-open byte span `[start, end)` of a method in a smali file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRegion {
    start: usize,
    end: usize,
}

impl MethodRegion {
    /// Start offset, at the begin marker.
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset, at the end marker.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Whether the given offset lies inside the region.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Text of the region.
    pub fn text<'c>(&self, code: &'c str) -> &'c str {
        &code[self.start..self.end]
    }

    /// First line of the region, holding the method name and descriptor.
    pub fn signature<'c>(&self, code: &'c str) -> &'c str {
        self.text(code).lines().next().unwrap_or("")
    }
}

/// Method regions of a file, in document order.
#[derive(Debug, Clone, Default)]
pub struct Methods {
    regions: Vec<MethodRegion>,
}

impl Methods {
    /// Delimits the method regions of the given code.
    pub fn extract(code: &str) -> Self {
        let begins = code.match_indices(METHOD_BEGIN).map(|(i, _)| i);
        let ends = code.match_indices(METHOD_END).map(|(i, _)| i);

        let regions = begins
            .zip(ends)
            // An end marker before its begin marker gives an empty region, not a reversed one.
            .map(|(start, end)| MethodRegion {
                start,
                end: end.max(start),
            })
            .collect();

        Self { regions }
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether no region was found.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterates over the regions in document order.
    pub fn iter(&self) -> impl Iterator<Item = &MethodRegion> {
        self.regions.iter()
    }

    /// Gets the region containing the given offset, if any.
    pub fn enclosing(&self, offset: usize) -> Option<&MethodRegion> {
        self.regions.iter().find(|r| r.contains(offset))
    }

    /// Gets the first region, in document order, whose text contains the given string.
    ///
    /// When several regions contain it, only the first one is returned.
    pub fn first_containing(&self, code: &str, needle: &str) -> Option<&MethodRegion> {
        self.regions.iter().find(|r| r.text(code).contains(needle))
    }

    /// Resolves the method of a match of `needle` starting at `offset`.
    pub fn resolve(
        &self,
        code: &str,
        resolution: Resolution,
        offset: usize,
        needle: &str,
    ) -> Option<&MethodRegion> {
        match resolution {
            Resolution::Offset => self.enclosing(offset),
            Resolution::FirstContaining => self.first_containing(code, needle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Methods, Resolution};

    const CODE: &str = ".class public Lcom/example/Checks;\n\
                        .super Ljava/lang/Object;\n\
                        \n\
                        .method public static isRooted()Z\n\
                        \x20   .locals 1\n\
                        \x20   const-string v0, \"/system/bin/su\"\n\
                        \x20   return v0\n\
                        .end method\n\
                        \n\
                        .method private static check()V\n\
                        \x20   const-string v0, \"/system/bin/su\"\n\
                        \x20   return-void\n\
                        .end method\n";

    #[test]
    fn it_pairs_markers_in_order() {
        let methods = Methods::extract(CODE);
        assert_eq!(methods.len(), 2);

        let signatures: Vec<_> = methods.iter().map(|r| r.signature(CODE)).collect();
        assert_eq!(
            signatures,
            vec![
                ".method public static isRooted()Z",
                ".method private static check()V"
            ]
        );
    }

    #[test]
    fn it_finds_the_enclosing_region_of_an_offset() {
        let methods = Methods::extract(CODE);
        let offset = CODE.find("return-void").unwrap();
        let region = methods.enclosing(offset).unwrap();
        assert_eq!(region.signature(CODE), ".method private static check()V");

        let region = methods.enclosing(methods.iter().next().unwrap().start()).unwrap();
        assert_eq!(region.signature(CODE), ".method public static isRooted()Z");
    }

    #[test]
    fn it_has_no_region_outside_methods() {
        let methods = Methods::extract(CODE);
        assert!(methods.enclosing(0).is_none());
        assert!(methods.enclosing(CODE.len() - 1).is_none());
        assert!(methods.enclosing(CODE.len() + 10).is_none());
    }

    #[test]
    fn it_returns_the_first_region_containing_a_string() {
        let methods = Methods::extract(CODE);
        let region = methods.first_containing(CODE, "/system/bin/su").unwrap();
        assert_eq!(region.signature(CODE), ".method public static isRooted()Z");

        let region = methods.first_containing(CODE, "return-void").unwrap();
        assert_eq!(region.signature(CODE), ".method private static check()V");

        assert!(methods.first_containing(CODE, ".super").is_none());
    }

    #[test]
    fn it_drops_unpaired_markers() {
        let code = ".method a()V\n.end method\n.method b()V\nnop\n";
        let methods = Methods::extract(code);
        assert_eq!(methods.len(), 1);
        assert!(methods.enclosing(code.find("nop").unwrap()).is_none());

        let code = ".method a()V\n.end method\n.end method\n";
        assert_eq!(Methods::extract(code).len(), 1);
    }

    #[test]
    fn it_keeps_mispaired_regions_empty() {
        let code = ".end method\n.method a()V\nnop\n";
        let methods = Methods::extract(code);
        assert_eq!(methods.len(), 1);
        let region = methods.iter().next().unwrap();
        assert_eq!(region.text(code), "");
        assert!(methods.enclosing(code.find("nop").unwrap()).is_none());
    }

    #[test]
    fn it_handles_code_without_methods() {
        let methods = Methods::extract(".class public La;\n");
        assert!(methods.is_empty());
        assert!(methods.enclosing(0).is_none());
    }

    #[test]
    fn it_resolves_by_offset_or_first_containing() {
        let methods = Methods::extract(CODE);
        let second = CODE.rfind("/system/bin/su").unwrap();

        let region = methods
            .resolve(CODE, Resolution::Offset, second, "/system/bin/su")
            .unwrap();
        assert_eq!(region.signature(CODE), ".method private static check()V");

        let region = methods
            .resolve(CODE, Resolution::FirstContaining, second, "/system/bin/su")
            .unwrap();
        assert_eq!(region.signature(CODE), ".method public static isRooted()Z");
    }
}
