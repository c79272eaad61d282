//! Prints the CRD manifests of all RDB kinds as YAML.

use kube::CustomResourceExt;

use rdb_operator::crd::{RDBDatabase, RDBInstance, RDBUser};

fn main() {
    let crds = [RDBInstance::crd(), RDBDatabase::crd(), RDBUser::crd()];
    for crd in crds {
        let yaml = serde_yaml::to_string(&crd).expect("CRD serializes to YAML");
        print!("---\n{yaml}");
    }
}
