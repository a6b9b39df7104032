//! iOS application delegate (Swift or Objective-C).

use regex::Regex;

use super::steps::{ImportStep, MethodStep, MethodVariant};
use super::{FileClass, TransformPipeline};
use crate::diagnostics::Platform;
use crate::error::PatchResult;
use crate::patch::anchor::{AnchorKind, Recognizer};
use crate::profile::IntegrationProfile;

const SWIFT_BUNDLE_URL: &str = r"override\s+func\s+bundleURL\(\)\s*->\s*URL\?";
const OBJC_BUNDLE_URL: &str = r"-\s*\(NSURL\s*\*\s*\)\s*bundleURL";
const OBJC_MARKER: &str = "@implementation";

/// Build the delegate pipeline: import, then the bundle URL override.
pub fn pipeline(profile: &IntegrationProfile) -> PatchResult<TransformPipeline> {
    let imports = ImportStep {
        platform: Platform::Ios,
        code: "ios-import",
        lines: vec![profile.ios_import.clone()],
        alternates: profile.ios_import_markers.clone(),
        dialect_lines: Some((OBJC_MARKER, vec![profile.ios_import_objc.clone()])),
        chain: vec![
            Recognizer::last_line_with_prefix("last-import", AnchorKind::LastImportLine, &["import ", "#import "]),
            Recognizer::file_start("file-start"),
        ],
    };

    let bundle_url = MethodStep {
        platform: Platform::Ios,
        code: "bundle-url-method",
        method: "bundleURL",
        variants: vec![
            MethodVariant {
                header: Regex::new(SWIFT_BUNDLE_URL)?,
                body: profile.ios_bundle_url_swift.clone(),
                dialect_marker: None,
            },
            MethodVariant {
                header: Regex::new(OBJC_BUNDLE_URL)?,
                body: profile.ios_bundle_url_objc.clone(),
                dialect_marker: Some(OBJC_MARKER),
            },
        ],
        chain: vec![
            Recognizer::before_line("objc-end", AnchorKind::ClosingMarker, r"^[ \t]*@end\b")?,
            Recognizer::last_closing_brace("last-brace"),
        ],
    };

    Ok(TransformPipeline::new(FileClass::NativeSource, Platform::Ios)
        .step(imports)
        .step(bundle_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticSink;
    use pretty_assertions::assert_eq;

    fn run(input: &str) -> (String, DiagnosticSink) {
        let pipeline = pipeline(&IntegrationProfile::default()).expect("valid patterns");
        let mut sink = DiagnosticSink::new();
        let out = pipeline.run(input.to_owned(), &mut sink);
        (out, sink)
    }

    const SWIFT: &str = "import Expo
import React

@UIApplicationMain
public class AppDelegate: ExpoAppDelegate {
  override func bundleURL() -> URL? {
#if DEBUG
    return RCTBundleURLProvider.sharedSettings().jsBundleURL(forBundleRoot: \".expo/.virtual-metro-entry\")
#else
    return Bundle.main.url(forResource: \"main\", withExtension: \"jsbundle\")
#endif
  }
}
";

    #[test]
    fn test_swift_method_replaced_and_import_added() {
        let (out, sink) = run(SWIFT);
        assert!(sink.is_empty());
        assert!(out.starts_with("import Expo\nimport React\nimport CodePush\n\n@UIApplicationMain"));
        assert!(out.contains("  override func bundleURL() -> URL? {\n  #if DEBUG\n"));
        assert!(out.contains("    return CodePush.bundleURL()\n"));
        assert!(!out.contains("withExtension"));
        assert!(out.ends_with("  }\n}\n"));
    }

    #[test]
    fn test_swift_second_run_is_noop() {
        let (once, _) = run(SWIFT);
        let (twice, sink) = run(&once);
        assert_eq!(twice, once);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_swift_method_inserted_before_last_brace() {
        let input = "import UIKit\n\nclass AppDelegate: RCTAppDelegate {\n    var window: UIWindow?\n}\n";
        let (out, sink) = run(input);
        assert!(sink.is_empty());
        assert!(out.contains("    var window: UIWindow?\n\n    override func bundleURL() -> URL? {\n"));
        assert!(out.ends_with("    }\n}\n"));
    }

    #[test]
    fn test_swift_method_lands_in_last_class() {
        let input = "import Expo\n\npublic class AppDelegate: ExpoAppDelegate {\n  var window: UIWindow?\n}\n\nclass ReactNativeDelegate: ExpoReactNativeFactoryDelegate {\n  override func sourceURL(for bridge: RCTBridge) -> URL? {\n    bridge.bundleURL ?? bundleURL()\n  }\n}\n";
        let (out, sink) = run(input);
        assert!(sink.is_empty());
        assert!(out.contains("public class AppDelegate: ExpoAppDelegate {\n  var window: UIWindow?\n}\n"));
        let delegate = out.find("class ReactNativeDelegate").expect("second class kept");
        let method = out.find("override func bundleURL()").expect("method inserted");
        assert!(method > delegate);
        assert!(out.ends_with("  }\n}\n"));
    }

    #[test]
    fn test_objc_method_inserted_before_end() {
        let input = "#import \"AppDelegate.h\"\n\n@implementation AppDelegate\n\n- (BOOL)application:(UIApplication *)application\n{\n  return YES;\n}\n\n@end\n";
        let (out, sink) = run(input);
        assert!(sink.is_empty());
        assert!(out.contains("#import \"AppDelegate.h\"\n#import <CodePush/CodePush.h>\n"));
        assert!(out.contains("- (NSURL *)bundleURL\n{\n"));
        assert!(out.contains("return [CodePush bundleURL];"));
        assert!(out.ends_with("#endif\n}\n@end\n"));

        let (again, _) = run(&out);
        assert_eq!(again, out);
    }

    #[test]
    fn test_objc_import_marker_counts_as_present() {
        let input = "#import <CodePush/CodePush.h>\n@implementation AppDelegate\n@end\n";
        let (out, _) = run(input);
        assert!(!out.contains("import CodePush\n@implementation"));
        assert_eq!(out.matches("CodePush/CodePush.h").count(), 1);
    }

    #[test]
    fn test_no_anchor_records_diagnostic() {
        let (out, sink) = run("");
        assert_eq!(out, "import CodePush\n");
        assert!(sink.contains_code("bundle-url-method"));
        assert_eq!(sink.len(), 1);
    }
}
