// Catalog XML parsing
//
// Expected shape:
//   <root>
//     <channel name="ccm">
//       <cdn><secure>https://...</secure></cdn>
//       <products>
//         <product id="PHSP" version="24.0">
//           <displayName>Photoshop</displayName>
//           <platforms><platform id="win64">
//             <languageSet buildGuid="...">
//               <dependencies>
//                 <dependency><sapCode>COSY</sapCode><baseVersion>2.5</baseVersion></dependency>
//               </dependencies>
//             </languageSet>
//           </platform></platforms>
//         </product>
//       </products>
//     </channel>
//   </root>

use super::{Catalog, DependencyRef, ProductNode, VersionEntry};
use crate::constants;
use crate::error::{Error, Result};
use crate::platform::Platform;
use roxmltree::{Document, Node};

const WHAT: &str = "catalog";

/// Parse a catalog document fetched for `platform`
pub fn parse_catalog(text: &str, platform: Platform) -> Result<Catalog> {
    let doc = Document::parse(text).map_err(|e| Error::parse(WHAT, e.to_string()))?;
    let root = doc.root_element();
    let channels: Vec<Node> = children(root, "channel").collect();

    let cdn = channels
        .iter()
        .filter_map(|channel| child(*channel, "cdn"))
        .filter_map(|cdn| child(cdn, "secure"))
        .find_map(text_of)
        .ok_or_else(|| Error::parse(WHAT, "missing channel/cdn/secure"))?;

    let mut catalog = Catalog::new(platform, cdn);

    for channel in channels {
        // Products outside the primary channel are kept for dependency lookups but never listed
        let primary = channel.attribute("name") == Some(constants::PRIMARY_CHANNEL);

        for products in children(channel, "products") {
            for product in children(products, "product") {
                match parse_product(product, primary, platform) {
                    Ok(node) => catalog.upsert(node),
                    Err(e) => log::warn!(
                        "Skipping catalog product {} {}: {}",
                        product.attribute("id").unwrap_or("?"),
                        product.attribute("version").unwrap_or("?"),
                        e
                    ),
                }
            }
        }
    }

    log::debug!(
        "Parsed catalog for {}: {} products, cdn {}",
        platform,
        catalog.len(),
        catalog.cdn
    );
    Ok(catalog)
}

fn parse_product(product: Node, primary: bool, platform: Platform) -> Result<ProductNode> {
    let sap_code = required_attribute(product, "id")?;
    let version = required_attribute(product, "version")?;

    let display_name = child(product, "displayName")
        .and_then(text_of)
        .unwrap_or_else(|| sap_code.clone());

    let platform_node = child(product, "platforms")
        .and_then(|platforms| child(platforms, "platform"))
        .ok_or_else(|| {
            Error::parse(
                WHAT,
                format!("product {} {} has no platforms/platform", sap_code, version),
            )
        })?;

    let language_set = child(platform_node, "languageSet").ok_or_else(|| {
        Error::parse(
            WHAT,
            format!("product {} {} has no languageSet", sap_code, version),
        )
    })?;
    let build_guid = required_attribute(language_set, "buildGuid")?;

    let dependencies = match child(language_set, "dependencies") {
        Some(deps) => deps
            .children()
            .filter(|n| n.has_tag_name("dependency"))
            .map(parse_dependency)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let hidden = platform_node.attribute("id") != Some(platform.as_str()) || !primary;

    Ok(ProductNode {
        display_name,
        hidden,
        version: VersionEntry {
            sap_code,
            version,
            build_guid,
            dependencies,
        },
    })
}

fn parse_dependency(node: Node) -> Result<DependencyRef> {
    let sap_code = child(node, "sapCode").and_then(text_of);
    let version = child(node, "baseVersion").and_then(text_of);

    match (sap_code, version) {
        (Some(sap_code), Some(version)) => Ok(DependencyRef { sap_code, version }),
        _ => Err(Error::parse(
            WHAT,
            "dependency without sapCode/baseVersion",
        )),
    }
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.has_tag_name(name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

fn text_of(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn required_attribute(node: Node, name: &str) -> Result<String> {
    node.attribute(name).map(str::to_string).ok_or_else(|| {
        Error::parse(
            WHAT,
            format!("<{}> is missing attribute '{}'", node.tag_name().name(), name),
        )
    })
}
