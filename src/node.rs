//! Cluster nodes.
//!
//! One launch command is built for one `Node`. Nodes are read once from the
//! node list csv and stay in file order for the whole run; the first node in
//! that order is the one correctness tests run on.

use std::fs;

use crate::error::LaunchError;

/// Hardware type to login domain. An unlisted type is a configuration
/// error, never a silent default.
static NODE_DOMAINS: &[(&str, &str)] = &[
    ("r320", "apt.emulab.net"),
    ("luigi", "cse.lehigh.edu"),
    ("r6525", "clemson.cloudlab.us"),
    ("xl170", "utah.cloudlab.us"),
    ("c6525-100g", "utah.cloudlab.us"),
    ("c6525-25g", "utah.cloudlab.us"),
    ("d6515", "utah.cloudlab.us"),
];

pub fn domain_name(kind: &str) -> Option<&'static str> {
    NODE_DOMAINS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, domain)| *domain)
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Numeric id stripped off the node name ("node3" -> 3).
    pub id: u32,
    /// Node name from the node list; also the launch log label.
    pub name: String,
    /// Login alias, combined with the domain to address the node.
    pub alias: String,
    /// Hardware type as written in the node list.
    pub kind: String,
    /// Login domain resolved from the hardware type.
    pub domain: &'static str,
}

impl Node {
    /// The `user@host` string the remote-login commands address.
    pub fn ssh_target(&self, user: &str) -> String {
        format!("{}@{}.{}", user, self.alias, self.domain)
    }
}

/// Reads the node list csv (`name,alias,type` rows, no header) into ordered
/// `Node`s. Rows must have exactly three fields and names must look like
/// `node<integer>`.
pub fn get_nodes(nodefile: &str) -> Result<Vec<Node>, LaunchError> {
    let contents = fs::read_to_string(nodefile).map_err(|source| LaunchError::FileRead {
        path: nodefile.to_string(),
        source,
    })?;
    let mut nodes = Vec::new();
    for row in contents.lines() {
        let row = row.trim();
        if row.is_empty() {
            continue;
        }
        let fields: Vec<&str> = row.split(',').map(str::trim).collect();
        let &[name, alias, kind] = fields.as_slice() else {
            return Err(LaunchError::MalformedNodeList(row.to_string()));
        };
        let id = name
            .strip_prefix("node")
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| LaunchError::MalformedNodeList(row.to_string()))?;
        let domain =
            domain_name(kind).ok_or_else(|| LaunchError::UnknownNodeType(kind.to_string()))?;
        nodes.push(Node {
            id,
            name: name.to_string(),
            alias: alias.to_string(),
            kind: kind.to_string(),
            domain,
        });
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_nodefile(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_domain_lookup() {
        assert_eq!(domain_name("r320"), Some("apt.emulab.net"));
        assert_eq!(domain_name("luigi"), Some("cse.lehigh.edu"));
        assert_eq!(domain_name("c6525-25g"), Some("utah.cloudlab.us"));
        assert_eq!(domain_name("gpu-node"), None);
    }

    #[test]
    fn test_get_nodes_preserves_order() {
        let file = write_nodefile("node0,apt074,r320\nnode1,apt083,r320\nnode2,amd157,d6515\n");
        let nodes = get_nodes(file.path().to_str().unwrap()).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].id, 0);
        assert_eq!(nodes[0].name, "node0");
        assert_eq!(nodes[0].domain, "apt.emulab.net");
        assert_eq!(nodes[2].id, 2);
        assert_eq!(nodes[2].domain, "utah.cloudlab.us");
    }

    #[test]
    fn test_ssh_target() {
        let file = write_nodefile("node4,apt074,r320\n");
        let nodes = get_nodes(file.path().to_str().unwrap()).unwrap();
        assert_eq!(nodes[0].ssh_target("esl"), "esl@apt074.apt.emulab.net");
    }

    #[test]
    fn test_unknown_node_type_is_fatal() {
        let file = write_nodefile("node0,apt074,m510\n");
        let err = get_nodes(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, LaunchError::UnknownNodeType(kind) if kind == "m510"));
    }

    #[test]
    fn test_malformed_rows() {
        // Two fields.
        let file = write_nodefile("node0,apt074\n");
        assert!(matches!(
            get_nodes(file.path().to_str().unwrap()),
            Err(LaunchError::MalformedNodeList(_))
        ));
        // Four fields.
        let file = write_nodefile("node0,apt074,r320,extra\n");
        assert!(matches!(
            get_nodes(file.path().to_str().unwrap()),
            Err(LaunchError::MalformedNodeList(_))
        ));
        // Name without the node prefix.
        let file = write_nodefile("host0,apt074,r320\n");
        assert!(matches!(
            get_nodes(file.path().to_str().unwrap()),
            Err(LaunchError::MalformedNodeList(_))
        ));
    }

    #[test]
    fn test_missing_nodefile_names_the_path() {
        let err = get_nodes("does_not_exist.csv").unwrap_err();
        assert!(matches!(err, LaunchError::FileRead { ref path, .. } if path == "does_not_exist.csv"));
        assert!(err.to_string().contains("does_not_exist.csv"));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let file = write_nodefile("node0,apt074,r320\n\nnode1,apt083,r320\n");
        let nodes = get_nodes(file.path().to_str().unwrap()).unwrap();
        assert_eq!(nodes.len(), 2);
    }
}
